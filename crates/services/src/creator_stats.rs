use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use creator_core::model::{CreatorCounters, CreatorStats, OwnerHandle, derive_stats};
use storage::repository::MetricsRepository;
use tracing::{debug, warn};

use crate::error::AggregateError;
use crate::session::SessionProvider;

#[derive(Default)]
struct StatsCache {
    owner: Option<OwnerHandle>,
    counters: Option<CreatorCounters>,
    error: Option<String>,
}

/// Dashboard statistics for a creator, derived from the latest counters.
pub struct CreatorStatsService {
    metrics: Arc<dyn MetricsRepository>,
    session: Arc<dyn SessionProvider>,
    cache: Mutex<StatsCache>,
}

impl CreatorStatsService {
    #[must_use]
    pub fn new(metrics: Arc<dyn MetricsRepository>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            metrics,
            session,
            cache: Mutex::new(StatsCache::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatsCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch `owner`'s counters and return the derived stats.
    ///
    /// `None` until a counters row exists. A failed fetch keeps the previous
    /// counters of the same owner and records the error; another owner's
    /// counters are never carried over.
    pub async fn refresh(&self, owner: &OwnerHandle) -> Option<CreatorStats> {
        let fetched = self.metrics.get_counters(owner).await;
        let mut cache = self.lock();
        if cache.owner.as_ref() != Some(owner) {
            *cache = StatsCache {
                owner: Some(owner.clone()),
                ..StatsCache::default()
            };
        }
        match fetched {
            Ok(counters) => {
                debug!(%owner, found = counters.is_some(), "creator counters loaded");
                cache.counters = counters;
                cache.error = None;
            }
            Err(err) => {
                warn!(%owner, error = %err, "creator counters fetch failed");
                cache.error = Some(AggregateError::from(err).to_string());
            }
        }
        cache.counters.as_ref().map(derive_stats)
    }

    /// Refresh stats of whoever is signed in.
    pub async fn refresh_current(&self) -> Option<CreatorStats> {
        match self.session.current_session().await {
            Some(session) => self.refresh(&session.owner).await,
            None => {
                self.lock().error = Some(AggregateError::SignedOut.to_string());
                None
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> Option<CreatorStats> {
        self.lock().counters.as_ref().map(derive_stats)
    }

    #[must_use]
    pub fn owner(&self) -> Option<OwnerHandle> {
        self.lock().owner.clone()
    }

    #[must_use]
    pub fn counters(&self) -> Option<CreatorCounters> {
        self.lock().counters.clone()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn clear(&self) {
        *self.lock() = StatsCache::default();
    }
}
