mod creator;
mod flyer;
mod ids;
mod progress;
mod session;

pub use creator::{
    CreatorCounters, CreatorStats, DEFAULT_GOLD_TARGET, DEFAULT_SILVER_TARGET, DEFAULT_STATUS,
    Tier, derive_stats,
};
pub use flyer::{
    DEFAULT_IMAGE_MIME, DEFAULT_IMAGE_NAME, ImageUpload, JobRequest, JobResult, JobState,
    JobValidationError, MAX_LABEL_CHARS, validate_job_request,
};
pub use ids::{IdError, OwnerHandle, VideoId};
pub use progress::{
    CourseProgress, DerivedProgress, DurationIndex, ProgressRecord, VideoMeta, course_progress,
    derive_progress, watch_percentage,
};
pub use session::{AuthState, AuthToken, Session};
