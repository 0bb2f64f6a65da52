use std::sync::Arc;
use std::time::Duration;

use creator_core::model::{CreatorCounters, OwnerHandle, VideoMeta};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{
    MetricsRepository, ProgressRepository, Storage, StorageError, VideoCatalogRepository,
};

mod mapping;
mod metrics_repo;
mod migrate;
mod progress_repo;
mod video_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or
    /// the connection pragmas fail.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    /// Write a counters row. The client never does this; seeding and tests do.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    pub async fn put_counters(
        &self,
        owner: &OwnerHandle,
        counters: &CreatorCounters,
    ) -> Result<(), StorageError> {
        metrics_repo::put_counters(&self.pool, owner, counters).await
    }

    /// Add or replace a catalog video at the given course position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be written.
    pub async fn put_video(&self, video: &VideoMeta, position: u32) -> Result<(), StorageError> {
        video_repo::put_video(&self.pool, video, position).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self::from_sqlite(repo))
    }

    #[must_use]
    pub fn from_sqlite(repo: SqliteRepository) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let metrics: Arc<dyn MetricsRepository> = Arc::new(repo.clone());
        let videos: Arc<dyn VideoCatalogRepository> = Arc::new(repo);
        Self {
            progress,
            metrics,
            videos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }
}
