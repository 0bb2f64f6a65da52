use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the schema migrations that have not been applied yet.
///
/// Version 1 creates progress, counters and the video catalog.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS video_progress (
                    owner TEXT NOT NULL,
                    video_id TEXT NOT NULL,
                    completed INTEGER NOT NULL DEFAULT 0 CHECK (completed IN (0, 1)),
                    watched_seconds INTEGER NOT NULL DEFAULT 0 CHECK (watched_seconds >= 0),
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (owner, video_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS creator_counters (
                    owner TEXT PRIMARY KEY,
                    total_diamonds INTEGER NOT NULL DEFAULT 0 CHECK (total_diamonds >= 0),
                    monthly_diamonds INTEGER NOT NULL DEFAULT 0 CHECK (monthly_diamonds >= 0),
                    diamonds_today INTEGER NOT NULL DEFAULT 0 CHECK (diamonds_today >= 0),
                    live_days INTEGER NOT NULL DEFAULT 0 CHECK (live_days >= 0),
                    live_seconds INTEGER NOT NULL DEFAULT 0 CHECK (live_seconds >= 0),
                    silver_target INTEGER,
                    gold_target INTEGER,
                    status TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS videos (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    duration_seconds INTEGER CHECK (duration_seconds >= 0),
                    position INTEGER NOT NULL DEFAULT 0
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_videos_position
                    ON videos (position, id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
