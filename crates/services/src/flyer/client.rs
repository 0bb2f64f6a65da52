use std::sync::Arc;

use async_trait::async_trait;
use creator_core::model::{AuthToken, JobRequest, JobResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{GENERIC_SERVICE_FAILURE, JobError};
use crate::session::SessionProvider;

/// Transport that sends one flyer request to the rendering service.
#[async_trait]
pub trait FlyerRenderer: Send + Sync {
    /// Send the request authenticated with `token` and map the single response.
    ///
    /// # Errors
    ///
    /// Returns `JobError` for transport failures and failed or unreadable responses.
    async fn render(&self, request: &JobRequest, token: &AuthToken)
    -> Result<JobResult, JobError>;
}

/// Resolves the caller's token and hands the request to a `FlyerRenderer`.
#[derive(Clone)]
pub struct JobClient {
    session: Arc<dyn SessionProvider>,
    renderer: Arc<dyn FlyerRenderer>,
}

impl JobClient {
    #[must_use]
    pub fn new(session: Arc<dyn SessionProvider>, renderer: Arc<dyn FlyerRenderer>) -> Self {
        Self { session, renderer }
    }

    /// Submit one job. No retries.
    ///
    /// The token is looked up on every call since sessions rotate and expire
    /// between submissions.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Auth` without any network call when nobody is signed in,
    /// otherwise whatever the renderer reports.
    pub async fn invoke(&self, request: &JobRequest) -> Result<JobResult, JobError> {
        let token = self.session.token().await.ok_or(JobError::Auth)?;
        debug!("sending flyer request");
        self.renderer.render(request, &token).await
    }
}

#[derive(Debug, Deserialize)]
struct FlyerResponse {
    url: String,
    path: String,
    width: u32,
    height: u32,
    duration_ms: u64,
}

impl From<FlyerResponse> for JobResult {
    fn from(body: FlyerResponse) -> Self {
        JobResult::new(body.url, body.path, body.width, body.height, body.duration_ms)
    }
}

fn failure_message(body: &Value) -> String {
    let nested = body.get("error").and_then(|err| err.get("message"));
    [body.get("message"), body.get("error"), nested]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map_or_else(|| GENERIC_SERVICE_FAILURE.to_owned(), str::to_owned)
}

/// Map a raw service response onto a job result.
///
/// A success body must carry `url`; a body naming an `error` or `message`
/// instead is a service failure, as is any non-success status.
///
/// # Errors
///
/// `JobError::Service` for reported failures, `JobError::Protocol` for empty or
/// malformed success bodies.
pub fn parse_flyer_response(success: bool, body: &[u8]) -> Result<JobResult, JobError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(if success {
            JobError::empty_response()
        } else {
            JobError::Service(GENERIC_SERVICE_FAILURE.to_owned())
        });
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if !success => return Err(JobError::Service(GENERIC_SERVICE_FAILURE.to_owned())),
        Err(err) => return Err(JobError::Protocol(format!("malformed response: {err}"))),
    };

    if success && value.is_null() {
        return Err(JobError::empty_response());
    }

    if success && value.get("url").is_some() {
        return serde_json::from_value::<FlyerResponse>(value)
            .map(JobResult::from)
            .map_err(|err| JobError::Protocol(format!("malformed response: {err}")));
    }

    if !success || value.get("error").is_some() || value.get("message").is_some() {
        return Err(JobError::Service(failure_message(&value)));
    }

    Err(JobError::Protocol("malformed response: missing url".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_message(result: Result<JobResult, JobError>) -> String {
        match result {
            Err(JobError::Service(message)) => message,
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn success_body_maps_every_field() {
        let body = br#"{"url":"https://cdn/f.png","path":"flyers/f.png","width":1080,"height":1350,"duration_ms":4200}"#;
        let result = parse_flyer_response(true, body).unwrap();
        assert_eq!(
            result,
            JobResult::new("https://cdn/f.png", "flyers/f.png", 1080, 1350, 4200)
        );
    }

    #[test]
    fn empty_success_body_is_a_protocol_error() {
        let err = parse_flyer_response(true, b"  ").unwrap_err();
        assert!(matches!(err, JobError::Protocol(_)));
        assert_eq!(err.to_string(), "empty response");
    }

    #[test]
    fn null_success_body_counts_as_empty() {
        let err = parse_flyer_response(true, b"null").unwrap_err();
        assert!(matches!(err, JobError::Protocol(_)));
        assert_eq!(err.to_string(), "empty response");

        assert_eq!(
            service_message(parse_flyer_response(false, b"null")),
            "Flyer generation failed."
        );
    }

    #[test]
    fn error_descriptor_uses_service_message() {
        let body = br#"{"message":"Image too large","details":"max 5MB"}"#;
        assert_eq!(service_message(parse_flyer_response(false, body)), "Image too large");

        let body = br#"{"error":"quota exceeded"}"#;
        assert_eq!(service_message(parse_flyer_response(true, body)), "quota exceeded");

        let body = br#"{"error":{"message":"renderer crashed"}}"#;
        assert_eq!(service_message(parse_flyer_response(false, body)), "renderer crashed");
    }

    #[test]
    fn failure_without_message_falls_back() {
        assert_eq!(
            service_message(parse_flyer_response(false, br#"{"details":null}"#)),
            "Flyer generation failed."
        );
        assert_eq!(
            service_message(parse_flyer_response(false, b"<html>502</html>")),
            "Flyer generation failed."
        );
        assert_eq!(
            service_message(parse_flyer_response(false, b"")),
            "Flyer generation failed."
        );
    }

    #[test]
    fn malformed_success_bodies_are_protocol_errors() {
        assert!(matches!(
            parse_flyer_response(true, b"not json"),
            Err(JobError::Protocol(_))
        ));
        assert!(matches!(
            parse_flyer_response(true, br#"{"url":"https://cdn/f.png"}"#),
            Err(JobError::Protocol(_))
        ));
        assert!(matches!(
            parse_flyer_response(true, br#"{"ok":true}"#),
            Err(JobError::Protocol(_))
        ));
    }
}
