//! Shared error types for the services crate.

use thiserror::Error;

use creator_core::model::JobValidationError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

pub(crate) const GENERIC_SERVICE_FAILURE: &str = "Flyer generation failed.";

/// Errors emitted while running a flyer job.
///
/// Every variant ends up as the message of `JobState::Error`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] JobValidationError),
    #[error("not authenticated; re-login required")]
    Auth,
    #[error("flyer generation is not configured")]
    Disabled,
    /// The service answered with an empty or unreadable body.
    #[error("{0}")]
    Protocol(String),
    /// The service reported a failure of its own.
    #[error("{0}")]
    Service(String),
    #[error("could not read image {uri}: {source}")]
    Image {
        uri: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl JobError {
    pub(crate) fn empty_response() -> Self {
        Self::Protocol("empty response".into())
    }
}

/// Errors recorded by the progress and stats aggregators.
///
/// These never cross the aggregators' public methods; they surface as
/// an `error()` message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AggregateError {
    #[error("not signed in")]
    SignedOut,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error("could not build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
