use std::sync::Arc;

use creator_core::Clock;
use creator_core::model::{AuthState, OwnerHandle};
use storage::repository::Storage;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::FlyerConfig;
use crate::creator_stats::CreatorStatsService;
use crate::error::AppServicesError;
use crate::flyer::{FlyerJob, HttpFlyerRenderer, JobClient};
use crate::progress_tracker::ProgressTracker;
use crate::session::{MemorySessionProvider, SessionProvider};

/// Assembles app-facing services around one session provider.
#[derive(Clone)]
pub struct AppServices {
    session: Arc<MemorySessionProvider>,
    flyer_job: Arc<FlyerJob>,
    flyer_enabled: bool,
    progress: Arc<ProgressTracker>,
    creator_stats: Arc<CreatorStatsService>,
}

impl AppServices {
    /// Build services over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::HttpClient` if the HTTP client cannot be built.
    pub fn new(
        storage: &Storage,
        clock: Clock,
        flyer: Option<FlyerConfig>,
    ) -> Result<Self, AppServicesError> {
        let session = Arc::new(MemorySessionProvider::new(clock));
        let provider: Arc<dyn SessionProvider> = Arc::clone(&session) as Arc<dyn SessionProvider>;

        let renderer = HttpFlyerRenderer::new(flyer).map_err(AppServicesError::HttpClient)?;
        let flyer_enabled = renderer.enabled();
        let flyer_job = Arc::new(FlyerJob::new(JobClient::new(
            Arc::clone(&provider),
            Arc::new(renderer),
        )));
        let progress = Arc::new(ProgressTracker::new(
            Arc::clone(&storage.progress),
            Arc::clone(&storage.videos),
            Arc::clone(&provider),
        ));
        let creator_stats = Arc::new(CreatorStatsService::new(
            Arc::clone(&storage.metrics),
            provider,
        ));

        Ok(Self {
            session,
            flyer_job,
            flyer_enabled,
            progress,
            creator_stats,
        })
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        flyer: Option<FlyerConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::new(&storage, clock, flyer)
    }

    /// Clear cached progress and stats whenever the signed-in creator changes.
    ///
    /// Runs until the session provider is dropped.
    #[must_use]
    pub fn spawn_auth_listener(&self) -> JoinHandle<()> {
        let mut rx = self.session.subscribe();
        let progress = Arc::clone(&self.progress);
        let creator_stats = Arc::clone(&self.creator_stats);
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let stale = match &state {
                    AuthState::SignedOut => true,
                    AuthState::SignedIn(owner) => {
                        let other = |cached: Option<OwnerHandle>| cached.is_some_and(|o| &o != owner);
                        other(progress.owner()) || other(creator_stats.owner())
                    }
                };
                if stale {
                    debug!(?state, "auth changed; clearing cached aggregates");
                    progress.clear();
                    creator_stats.clear();
                }
            }
        })
    }

    #[must_use]
    pub fn session(&self) -> Arc<MemorySessionProvider> {
        Arc::clone(&self.session)
    }

    #[must_use]
    pub fn flyer_job(&self) -> Arc<FlyerJob> {
        Arc::clone(&self.flyer_job)
    }

    #[must_use]
    pub fn flyer_enabled(&self) -> bool {
        self.flyer_enabled
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn creator_stats(&self) -> Arc<CreatorStatsService> {
        Arc::clone(&self.creator_stats)
    }
}
