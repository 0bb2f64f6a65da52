use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use creator_core::model::{JobRequest, JobState};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::client::JobClient;
use crate::error::GENERIC_SERVICE_FAILURE;

enum Admission {
    /// Another submission is loading; wait for its outcome.
    Joined,
    Rejected,
    Started(u64),
}

struct Shared {
    client: JobClient,
    state: watch::Sender<JobState>,
    generation: AtomicU64,
}

impl Shared {
    fn state(&self) -> JobState {
        self.state.borrow().clone()
    }

    async fn run(&self, request: JobRequest, generation: u64) -> JobState {
        info!(title = %request.title.trim(), "submitting flyer job");
        let next = match self.client.invoke(&request).await {
            Ok(result) => {
                info!(url = result.url(), duration_ms = result.duration_ms(), "flyer ready");
                JobState::Success(result)
            }
            Err(err) => {
                warn!(error = %err, "flyer job failed");
                JobState::Error(err.to_string())
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next.clone();
            true
        });

        if applied {
            next
        } else {
            debug!("flyer job was reset while loading; result discarded");
            self.state()
        }
    }
}

/// Flyer job state machine: `Idle -> Loading -> Success | Error`.
///
/// Transitions happen inside the watch channel's write lock, so admission,
/// completion and reset never interleave. The generation counter is only read
/// and written under that lock.
///
/// The remote call runs on its own task: dropping a `submit` future stops the
/// wait, not the job, and the state still reaches a terminal value.
pub struct FlyerJob {
    inner: Arc<Shared>,
}

impl FlyerJob {
    #[must_use]
    pub fn new(client: JobClient) -> Self {
        let (state, _) = watch::channel(JobState::Idle);
        Self {
            inner: Arc::new(Shared {
                client,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        self.inner.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.inner.state.subscribe()
    }

    /// Validate and run one flyer job, returning the state it ended in.
    ///
    /// An invalid request goes straight to `Error` without a network call.
    /// While a submission is loading, further calls start nothing and resolve
    /// to that submission's outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn submit(&self, request: JobRequest) -> JobState {
        let inner = &self.inner;
        let mut admission = Admission::Joined;
        inner.state.send_if_modified(|state| {
            if state.is_loading() {
                return false;
            }
            match request.validate() {
                Err(reason) => {
                    *state = JobState::Error(reason.to_string());
                    admission = Admission::Rejected;
                }
                Ok(()) => {
                    *state = JobState::Loading;
                    admission =
                        Admission::Started(inner.generation.fetch_add(1, Ordering::SeqCst) + 1);
                }
            }
            true
        });

        match admission {
            Admission::Joined => {
                debug!("flyer job already loading; joining it");
                self.wait_for_outcome().await
            }
            Admission::Rejected => {
                let state = self.state();
                info!(reason = state.error_message().unwrap_or_default(), "flyer request rejected");
                state
            }
            Admission::Started(generation) => {
                let task = tokio::spawn({
                    let inner = Arc::clone(inner);
                    async move { inner.run(request, generation).await }
                });
                match task.await {
                    Ok(state) => state,
                    Err(err) => {
                        warn!(error = %err, "flyer job task ended abnormally");
                        self.fail_if_current(generation, GENERIC_SERVICE_FAILURE)
                    }
                }
            }
        }
    }

    /// Back to `Idle` from any state. A submission still loading is discarded
    /// when it finishes.
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = JobState::Idle;
        });
    }

    fn fail_if_current(&self, generation: u64, message: &str) -> JobState {
        self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = JobState::Error(message.to_owned());
            true
        });
        self.state()
    }

    async fn wait_for_outcome(&self) -> JobState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.state(),
        }
    }
}
