use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use creator_core::model::{
    CourseProgress, DerivedProgress, DurationIndex, OwnerHandle, ProgressRecord, VideoId,
    course_progress, derive_progress,
};
use storage::repository::{ProgressRepository, VideoCatalogRepository};
use tracing::{debug, warn};

use crate::error::AggregateError;
use crate::session::SessionProvider;

#[derive(Default)]
struct ProgressCache {
    owner: Option<OwnerHandle>,
    records: Vec<ProgressRecord>,
    durations: DurationIndex,
    error: Option<String>,
}

impl ProgressCache {
    fn derived(&self) -> Vec<DerivedProgress> {
        derive_progress(&self.records, &self.durations)
    }

    fn record(&self, video_id: &VideoId) -> Option<&ProgressRecord> {
        self.records.iter().find(|r| &r.video_id == video_id)
    }
}

/// Read-through cache of a creator's course progress.
///
/// Failures never escape the public methods; the latest one is kept in
/// [`ProgressTracker::error`]. Local writes are optimistic: the cache changes
/// first and stays changed even if the store rejects the upsert.
pub struct ProgressTracker {
    progress: Arc<dyn ProgressRepository>,
    videos: Arc<dyn VideoCatalogRepository>,
    session: Arc<dyn SessionProvider>,
    cache: Mutex<ProgressCache>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(
        progress: Arc<dyn ProgressRepository>,
        videos: Arc<dyn VideoCatalogRepository>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            progress,
            videos,
            session,
            cache: Mutex::new(ProgressCache::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch `owner`'s progress and replace the cache with it.
    ///
    /// Returns the derived progress in store order. On failure the previous
    /// cache of the same owner is kept and the error recorded.
    pub async fn load(&self, owner: &OwnerHandle) -> Vec<DerivedProgress> {
        let fetched = self.progress.list_progress(owner).await;
        let durations = match self.videos.list_videos().await {
            Ok(videos) => DurationIndex::from_videos(&videos),
            Err(err) => {
                warn!(error = %err, "video catalog unavailable; percentages default to 0");
                DurationIndex::default()
            }
        };

        let mut cache = self.lock();
        if cache.owner.as_ref() != Some(owner) {
            *cache = ProgressCache {
                owner: Some(owner.clone()),
                ..ProgressCache::default()
            };
        }
        cache.durations = durations;
        match fetched {
            Ok(records) => {
                debug!(%owner, rows = records.len(), "progress loaded");
                cache.records = records;
                cache.error = None;
            }
            Err(err) => {
                warn!(%owner, error = %err, "progress fetch failed");
                cache.error = Some(AggregateError::from(err).to_string());
            }
        }
        cache.derived()
    }

    /// Load progress of whoever is signed in.
    pub async fn load_current(&self) -> Vec<DerivedProgress> {
        match self.session.current_session().await {
            Some(session) => self.load(&session.owner).await,
            None => {
                self.lock().error = Some(AggregateError::SignedOut.to_string());
                Vec::new()
            }
        }
    }

    /// True iff a completed record exists for the video.
    #[must_use]
    pub fn is_watched(&self, video_id: &VideoId) -> bool {
        self.lock().record(video_id).is_some_and(|r| r.completed)
    }

    #[must_use]
    pub fn course_progress(&self, video_ids: &[VideoId]) -> CourseProgress {
        course_progress(&self.lock().records, video_ids)
    }

    #[must_use]
    pub fn progress_for(&self, video_id: &VideoId) -> Option<DerivedProgress> {
        let cache = self.lock();
        cache
            .record(video_id)
            .map(|record| derive_progress(std::slice::from_ref(record), &cache.durations))
            .and_then(|derived| derived.into_iter().next())
    }

    #[must_use]
    pub fn items(&self) -> Vec<DerivedProgress> {
        self.lock().derived()
    }

    #[must_use]
    pub fn owner(&self) -> Option<OwnerHandle> {
        self.lock().owner.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Drop everything cached, e.g. after sign-out.
    pub fn clear(&self) {
        *self.lock() = ProgressCache::default();
    }

    /// Mark a video as completed, locally first and then in the store.
    pub async fn mark_watched(&self, video_id: &VideoId) {
        self.upsert(video_id, |record| record.completed = true).await;
    }

    /// Record playback position; watched seconds only ever grow.
    pub async fn record_watch_time(&self, video_id: &VideoId, seconds: u32) {
        self.upsert(video_id, |record| {
            record.watched_seconds = record.watched_seconds.max(seconds);
        })
        .await;
    }

    async fn resolve_owner(&self) -> Option<OwnerHandle> {
        if let Some(owner) = self.owner() {
            return Some(owner);
        }
        self.session
            .current_session()
            .await
            .map(|session| session.owner)
    }

    async fn upsert(&self, video_id: &VideoId, apply: impl FnOnce(&mut ProgressRecord)) {
        let Some(owner) = self.resolve_owner().await else {
            self.lock().error = Some(AggregateError::SignedOut.to_string());
            return;
        };

        let record = {
            let mut cache = self.lock();
            if cache.owner.as_ref().is_some_and(|current| current != &owner) {
                debug!(%owner, "cache switched owner before the write; skipping");
                return;
            }
            if cache.owner.is_none() {
                cache.owner = Some(owner.clone());
            }
            let index = match cache.records.iter().position(|r| &r.video_id == video_id) {
                Some(index) => index,
                None => {
                    cache
                        .records
                        .push(ProgressRecord::new(owner, video_id.clone()));
                    cache.records.len() - 1
                }
            };
            apply(&mut cache.records[index]);
            cache.records[index].clone()
        };

        // Optimistic: no rollback when the store rejects the write.
        if let Err(err) = self.progress.upsert_progress(&record).await {
            warn!(video = %video_id, error = %err, "progress upsert failed; keeping local state");
            self.lock().error = Some(AggregateError::from(err).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use creator_core::model::{AuthState, AuthToken, Session, VideoMeta};
    use creator_core::time::fixed_clock;
    use tokio::sync::{Notify, watch};
    use storage::repository::{InMemoryRepository, StorageError};

    use crate::session::MemorySessionProvider;

    fn owner(raw: &str) -> OwnerHandle {
        OwnerHandle::parse(raw).unwrap()
    }

    fn vid(raw: &str) -> VideoId {
        VideoId::parse(raw).unwrap()
    }

    fn session(owner_handle: Option<&str>) -> Arc<MemorySessionProvider> {
        let provider = Arc::new(MemorySessionProvider::new(fixed_clock()));
        if let Some(handle) = owner_handle {
            provider.sign_in(Session::new(owner(handle), AuthToken::new("t")));
        }
        provider
    }

    fn tracker(repo: &InMemoryRepository, session: Arc<MemorySessionProvider>) -> ProgressTracker {
        ProgressTracker::new(Arc::new(repo.clone()), Arc::new(repo.clone()), session)
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore(InMemoryRepository);

    #[async_trait]
    impl ProgressRepository for ReadOnlyStore {
        async fn list_progress(
            &self,
            owner: &OwnerHandle,
        ) -> Result<Vec<ProgressRecord>, StorageError> {
            self.0.list_progress(owner).await
        }

        async fn upsert_progress(&self, _record: &ProgressRecord) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }
    }

    #[tokio::test]
    async fn load_derives_percentages_in_store_order() {
        let repo = InMemoryRepository::new();
        repo.put_video(VideoMeta {
            id: vid("a"),
            title: "A".into(),
            duration_seconds: Some(200),
        })
        .unwrap();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("b")).completed())
            .await
            .unwrap();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("a")).with_watched_seconds(150))
            .await
            .unwrap();

        let tracker = tracker(&repo, session(None));
        let items = tracker.load(&owner("nova")).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].video_id, vid("b"));
        assert_eq!(items[0].percentage, 0);
        assert_eq!(items[1].percentage, 75);
        assert!(tracker.error().is_none());
    }

    #[tokio::test]
    async fn unknown_video_is_not_watched() {
        let repo = InMemoryRepository::new();
        let tracker = tracker(&repo, session(Some("nova")));
        tracker.load(&owner("nova")).await;

        assert!(!tracker.is_watched(&vid("missing")));
        assert!(tracker.progress_for(&vid("missing")).is_none());
        assert_eq!(tracker.course_progress(&[]), CourseProgress { completed: 0, total: 0 });
    }

    #[tokio::test]
    async fn mark_watched_is_idempotent_and_persisted() {
        let repo = InMemoryRepository::new();
        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("a")).with_watched_seconds(30))
            .await
            .unwrap();
        let tracker = tracker(&repo, session(Some("nova")));
        tracker.load(&owner("nova")).await;

        tracker.mark_watched(&vid("a")).await;
        tracker.mark_watched(&vid("a")).await;

        assert!(tracker.is_watched(&vid("a")));
        assert_eq!(tracker.items().len(), 1);
        let stored = repo.progress_row(&owner("nova"), &vid("a")).unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.watched_seconds, 30);
    }

    #[tokio::test]
    async fn course_progress_counts_marked_videos() {
        let repo = InMemoryRepository::new();
        let tracker = tracker(&repo, session(Some("nova")));
        tracker.load(&owner("nova")).await;

        tracker.mark_watched(&vid("a")).await;
        tracker.record_watch_time(&vid("b"), 45).await;

        let progress = tracker.course_progress(&[vid("a"), vid("b"), vid("c")]);
        assert_eq!(progress, CourseProgress { completed: 1, total: 3 });
    }

    #[tokio::test]
    async fn failed_upsert_keeps_optimistic_state() {
        let repo = InMemoryRepository::new();
        let tracker = ProgressTracker::new(
            Arc::new(ReadOnlyStore(repo.clone())),
            Arc::new(repo.clone()),
            session(Some("nova")),
        );
        tracker.load(&owner("nova")).await;

        tracker.mark_watched(&vid("a")).await;

        assert!(tracker.is_watched(&vid("a")));
        assert!(tracker.error().unwrap().contains("offline"));
        assert!(repo.progress_row(&owner("nova"), &vid("a")).unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_watched_before_load_uses_signed_in_owner() {
        let repo = InMemoryRepository::new();
        let tracker = tracker(&repo, session(Some("nova")));

        tracker.mark_watched(&vid("a")).await;

        assert_eq!(tracker.owner(), Some(owner("nova")));
        assert!(repo.progress_row(&owner("nova"), &vid("a")).unwrap().unwrap().completed);
    }

    #[tokio::test]
    async fn signed_out_writes_record_an_error() {
        let repo = InMemoryRepository::new();
        let tracker = tracker(&repo, session(None));

        tracker.mark_watched(&vid("a")).await;

        assert!(!tracker.is_watched(&vid("a")));
        assert_eq!(tracker.error().as_deref(), Some("not signed in"));
        assert!(tracker.load_current().await.is_empty());
    }

    #[tokio::test]
    async fn refetch_replaces_the_cache() {
        let repo = InMemoryRepository::new();
        let tracker = tracker(&repo, session(Some("nova")));
        tracker.load(&owner("nova")).await;
        tracker.record_watch_time(&vid("a"), 10).await;
        tracker.record_watch_time(&vid("a"), 5).await;
        assert_eq!(tracker.progress_for(&vid("a")).unwrap().watched_seconds, 10);

        repo.upsert_progress(&ProgressRecord::new(owner("nova"), vid("a")).completed())
            .await
            .unwrap();
        let items = tracker.load(&owner("nova")).await;

        assert_eq!(items.len(), 1);
        assert!(items[0].completed);
        assert_eq!(items[0].watched_seconds, 0);
    }

    /// Session lookup that blocks until released.
    struct GatedSession {
        inner: Arc<MemorySessionProvider>,
        gate: Notify,
    }

    #[async_trait]
    impl SessionProvider for GatedSession {
        async fn current_session(&self) -> Option<Session> {
            self.gate.notified().await;
            self.inner.current_session().await
        }

        fn subscribe(&self) -> watch::Receiver<AuthState> {
            self.inner.subscribe()
        }
    }

    #[tokio::test]
    async fn write_racing_an_owner_switch_stays_out_of_the_new_cache() {
        let repo = InMemoryRepository::new();
        let session = Arc::new(GatedSession {
            inner: session(Some("nova")),
            gate: Notify::new(),
        });
        let tracker = ProgressTracker::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::clone(&session) as Arc<dyn SessionProvider>,
        );

        let a = vid("a");
        tokio::join!(tracker.mark_watched(&a), async {
            tracker.load(&owner("blaze")).await;
            session.gate.notify_one();
        });

        assert_eq!(tracker.owner(), Some(owner("blaze")));
        assert!(tracker.items().is_empty());
        assert!(repo.progress_row(&owner("nova"), &vid("a")).unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_forgets_owner_and_records() {
        let repo = InMemoryRepository::new();
        let tracker = tracker(&repo, session(Some("nova")));
        tracker.load(&owner("nova")).await;
        tracker.mark_watched(&vid("a")).await;

        tracker.clear();

        assert!(tracker.owner().is_none());
        assert!(tracker.items().is_empty());
    }
}
