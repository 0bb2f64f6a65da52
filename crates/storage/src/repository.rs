use async_trait::async_trait;
use creator_core::model::{CreatorCounters, OwnerHandle, ProgressRecord, VideoId, VideoMeta};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-video watch progress owned by the remote store.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch every progress row of an owner, in store order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be read.
    async fn list_progress(&self, owner: &OwnerHandle) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Insert the record, or update the row already keyed by `(owner, video_id)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;
}

/// Read-only access to a creator's raw counters.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    /// Fetch the counters row of an owner, `None` if the creator has none yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be read or decoded.
    async fn get_counters(&self, owner: &OwnerHandle)
    -> Result<Option<CreatorCounters>, StorageError>;
}

#[async_trait]
pub trait VideoCatalogRepository: Send + Sync {
    /// List course videos with their durations, in course order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the catalog cannot be read.
    async fn list_videos(&self) -> Result<Vec<VideoMeta>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<Vec<ProgressRecord>>>,
    counters: Arc<Mutex<HashMap<OwnerHandle, CreatorCounters>>>,
    videos: Arc<Mutex<Vec<VideoMeta>>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the counters row of an owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_counters(
        &self,
        owner: OwnerHandle,
        counters: CreatorCounters,
    ) -> Result<(), StorageError> {
        self.counters.lock().map_err(poisoned)?.insert(owner, counters);
        Ok(())
    }

    /// Add a video to the catalog, replacing one with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_video(&self, video: VideoMeta) -> Result<(), StorageError> {
        let mut guard = self.videos.lock().map_err(poisoned)?;
        match guard.iter_mut().find(|v| v.id == video.id) {
            Some(existing) => *existing = video,
            None => guard.push(video),
        }
        Ok(())
    }

    /// Look up a single stored row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn progress_row(
        &self,
        owner: &OwnerHandle,
        video_id: &VideoId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .find(|r| &r.owner == owner && &r.video_id == video_id)
            .cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn list_progress(&self, owner: &OwnerHandle) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.iter().filter(|r| &r.owner == owner).cloned().collect())
    }

    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        match guard
            .iter_mut()
            .find(|r| r.owner == record.owner && r.video_id == record.video_id)
        {
            Some(existing) => *existing = record.clone(),
            None => guard.push(record.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsRepository for InMemoryRepository {
    async fn get_counters(
        &self,
        owner: &OwnerHandle,
    ) -> Result<Option<CreatorCounters>, StorageError> {
        let guard = self.counters.lock().map_err(poisoned)?;
        Ok(guard.get(owner).cloned())
    }
}

#[async_trait]
impl VideoCatalogRepository for InMemoryRepository {
    async fn list_videos(&self) -> Result<Vec<VideoMeta>, StorageError> {
        Ok(self.videos.lock().map_err(poisoned)?.clone())
    }
}

/// Aggregates the store repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub metrics: Arc<dyn MetricsRepository>,
    pub videos: Arc<dyn VideoCatalogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
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

    fn owner(raw: &str) -> OwnerHandle {
        OwnerHandle::parse(raw).unwrap()
    }

    fn vid(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn upsert_updates_in_place_and_keeps_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("a")))
            .await
            .unwrap();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("b")))
            .await
            .unwrap();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("a")).completed())
            .await
            .unwrap();

        let rows = repo.list_progress(&owner("nova")).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].video_id, vid("a"));
        assert!(rows[0].completed);
        assert_eq!(rows[1].video_id, vid("b"));
    }

    #[tokio::test]
    async fn rows_are_scoped_by_owner() {
        let repo = InMemoryRepository::new();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("a")).completed())
            .await
            .unwrap();

        assert!(repo.list_progress(&owner("blaze")).await.unwrap().is_empty());
        assert!(repo.progress_row(&owner("blaze"), &vid("a")).unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_counters_are_none() {
        let storage = Storage::in_memory();
        assert!(storage.metrics.get_counters(&owner("nova")).await.unwrap().is_none());
    }
}
