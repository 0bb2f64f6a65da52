use async_trait::async_trait;
use creator_core::model::{AuthToken, ImageUpload, JobRequest, JobResult};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use super::client::{FlyerRenderer, parse_flyer_response};
use crate::config::FlyerConfig;
use crate::error::JobError;

/// Sends flyer jobs as multipart requests over HTTPS.
#[derive(Clone)]
pub struct HttpFlyerRenderer {
    client: Client,
    config: Option<FlyerConfig>,
}

impl HttpFlyerRenderer {
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: Option<FlyerConfig>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(config) = config.as_ref() {
            builder = builder.timeout(config.timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn image_bytes(&self, image: &ImageUpload) -> Result<Vec<u8>, JobError> {
        let uri = image.uri.trim();
        if uri.starts_with("http://") || uri.starts_with("https://") {
            let response = self.client.get(uri).send().await?.error_for_status()?;
            return Ok(response.bytes().await?.to_vec());
        }

        let path = uri.strip_prefix("file://").unwrap_or(uri);
        tokio::fs::read(path).await.map_err(|source| JobError::Image {
            uri: image.uri.clone(),
            source,
        })
    }

    async fn build_form(&self, request: &JobRequest) -> Result<Form, JobError> {
        let bytes = self.image_bytes(&request.image).await?;
        let image = Part::bytes(bytes)
            .file_name(request.image.file_name().to_owned())
            .mime_str(request.image.mime())?;

        Ok(Form::new()
            .text("title", request.title.trim().to_owned())
            .text("creatorName", request.creator_label.trim().to_owned())
            .text("opponentName", request.opponent_label.trim().to_owned())
            .text("battleDate", request.event_date.trim().to_owned())
            .part("image", image))
    }
}

#[async_trait]
impl FlyerRenderer for HttpFlyerRenderer {
    async fn render(
        &self,
        request: &JobRequest,
        token: &AuthToken,
    ) -> Result<JobResult, JobError> {
        let config = self.config.as_ref().ok_or(JobError::Disabled)?;
        let form = self.build_form(request).await?;

        let mut builder = self
            .client
            .post(&config.endpoint)
            .bearer_auth(token.expose())
            .multipart(form);
        if let Some(api_key) = config.api_key.as_deref() {
            builder = builder.header("apikey", api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "flyer service responded");
        if !status.is_success() {
            warn!(%status, "flyer service returned an error status");
        }

        parse_flyer_response(status.is_success(), &body)
    }
}
