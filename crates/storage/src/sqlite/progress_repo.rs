use async_trait::async_trait;
use chrono::Utc;
use creator_core::model::{OwnerHandle, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn list_progress(&self, owner: &OwnerHandle) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT owner, video_id, completed, watched_seconds
                FROM video_progress
                WHERE owner = ?1
                ORDER BY rowid
            ",
        )
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO video_progress (
                    owner, video_id, completed, watched_seconds, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(owner, video_id) DO UPDATE SET
                    completed = excluded.completed,
                    watched_seconds = excluded.watched_seconds,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(record.owner.as_str())
        .bind(record.video_id.as_str())
        .bind(record.completed)
        .bind(i64::from(record.watched_seconds))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
