use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound, in characters, for every free-text flyer field.
pub const MAX_LABEL_CHARS: usize = 40;

pub const DEFAULT_IMAGE_NAME: &str = "photo.jpg";
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

//
// ─── REQUEST ───────────────────────────────────────────────────────────────────
//

/// Picked image for the flyer background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUpload {
    pub uri: String,
    pub name: Option<String>,
    pub mime_type: Option<String>,
}

impl ImageUpload {
    #[must_use]
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            mime_type: None,
        }
    }

    /// File name sent with the multipart part, `photo.jpg` when unspecified.
    #[must_use]
    pub fn file_name(&self) -> &str {
        non_blank(self.name.as_deref()).unwrap_or(DEFAULT_IMAGE_NAME)
    }

    /// MIME type sent with the multipart part, `image/jpeg` when unspecified.
    #[must_use]
    pub fn mime(&self) -> &str {
        non_blank(self.mime_type.as_deref()).unwrap_or(DEFAULT_IMAGE_MIME)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Everything needed to ask the rendering service for one battle flyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub title: String,
    pub creator_label: String,
    pub opponent_label: String,
    pub event_date: String,
    pub image: ImageUpload,
}

impl JobRequest {
    /// Runs the pre-flight checks; see [`validate_job_request`].
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<(), JobValidationError> {
        validate_job_request(self)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum JobValidationError {
    #[error("Title must be 1-40 characters.")]
    Title,
    #[error("Creator name must be 1-40 characters.")]
    CreatorLabel,
    #[error("Opponent name must be 1-40 characters.")]
    OpponentLabel,
    #[error("Battle date is required.")]
    EventDate,
    #[error("Please select an image.")]
    Image,
}

fn label_ok(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_LABEL_CHARS
}

/// Checks a job request before any network activity.
///
/// Checks run in field order and stop at the first failure.
///
/// # Errors
///
/// Returns the `JobValidationError` of the first field that fails.
pub fn validate_job_request(request: &JobRequest) -> Result<(), JobValidationError> {
    if !label_ok(&request.title) {
        return Err(JobValidationError::Title);
    }
    if !label_ok(&request.creator_label) {
        return Err(JobValidationError::CreatorLabel);
    }
    if !label_ok(&request.opponent_label) {
        return Err(JobValidationError::OpponentLabel);
    }
    if request.event_date.trim().is_empty() {
        return Err(JobValidationError::EventDate);
    }
    if request.image.uri.trim().is_empty() {
        return Err(JobValidationError::Image);
    }
    Ok(())
}

//
// ─── RESULT & STATE ────────────────────────────────────────────────────────────
//

/// Generated flyer as reported by the rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    url: String,
    storage_path: String,
    width: u32,
    height: u32,
    duration_ms: u64,
}

impl JobResult {
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        storage_path: impl Into<String>,
        width: u32,
        height: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            url: url.into(),
            storage_path: storage_path.into(),
            width,
            height,
            duration_ms,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// Observable state of one flyer job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Loading,
    Success(JobResult),
    Error(String),
}

impl JobState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, JobState::Loading)
    }

    /// `Success` and `Error` end a submission.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success(_) | JobState::Error(_))
    }

    #[must_use]
    pub fn result(&self) -> Option<&JobResult> {
        match self {
            JobState::Success(result) => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            JobState::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> JobRequest {
        JobRequest {
            title: "Friday Night Battle".into(),
            creator_label: "Nova".into(),
            opponent_label: "Blaze".into(),
            event_date: "2026-10-30".into(),
            image: ImageUpload::from_uri("file:///tmp/bg.jpg"),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert_eq!(validate_job_request(&request()), Ok(()));
    }

    #[test]
    fn title_of_41_chars_is_rejected() {
        let mut req = request();
        req.title = "x".repeat(41);
        let err = validate_job_request(&req).unwrap_err();
        assert_eq!(err.to_string(), "Title must be 1-40 characters.");

        req.title = "x".repeat(40);
        assert!(validate_job_request(&req).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut req = request();
        req.creator_label = "é".repeat(40);
        assert!(validate_job_request(&req).is_ok());
    }

    #[test]
    fn first_failing_field_wins() {
        let mut req = request();
        req.opponent_label = "  ".into();
        req.event_date = String::new();
        req.image.uri = String::new();
        assert_eq!(
            validate_job_request(&req),
            Err(JobValidationError::OpponentLabel)
        );

        let mut req = request();
        req.event_date = String::new();
        req.image.uri = String::new();
        assert_eq!(validate_job_request(&req), Err(JobValidationError::EventDate));

        let mut req = request();
        req.image.uri = " ".into();
        assert_eq!(validate_job_request(&req), Err(JobValidationError::Image));
    }

    #[test]
    fn image_defaults_apply_when_unspecified() {
        let mut image = ImageUpload::from_uri("content://picked/42");
        assert_eq!(image.file_name(), "photo.jpg");
        assert_eq!(image.mime(), "image/jpeg");

        image.name = Some("bg.png".into());
        image.mime_type = Some("image/png".into());
        assert_eq!(image.file_name(), "bg.png");
        assert_eq!(image.mime(), "image/png");
    }

    #[test]
    fn state_accessors() {
        let ok = JobState::Success(JobResult::new("https://cdn/x.png", "flyers/x.png", 1080, 1350, 900));
        assert!(ok.is_terminal());
        assert_eq!(ok.result().map(JobResult::width), Some(1080));
        assert!(JobState::Loading.is_loading());
        assert!(!JobState::Idle.is_terminal());
        assert_eq!(JobState::Error("boom".into()).error_message(), Some("boom"));
    }
}
