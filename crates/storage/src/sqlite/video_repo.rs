use async_trait::async_trait;
use creator_core::model::VideoMeta;
use sqlx::SqlitePool;

use super::SqliteRepository;
use super::mapping::{conn, map_video_row};
use crate::repository::{StorageError, VideoCatalogRepository};

#[async_trait]
impl VideoCatalogRepository for SqliteRepository {
    async fn list_videos(&self) -> Result<Vec<VideoMeta>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, duration_seconds
                FROM videos
                ORDER BY position, id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_video_row).collect()
    }
}

pub(super) async fn put_video(
    pool: &SqlitePool,
    video: &VideoMeta,
    position: u32,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
            INSERT INTO videos (id, title, duration_seconds, position)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                duration_seconds = excluded.duration_seconds,
                position = excluded.position
        ",
    )
    .bind(video.id.as_str())
    .bind(video.title.as_str())
    .bind(video.duration_seconds.map(i64::from))
    .bind(i64::from(position))
    .execute(pool)
    .await
    .map_err(conn)?;

    Ok(())
}
