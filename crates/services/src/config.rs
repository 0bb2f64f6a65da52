use std::env;
use std::time::Duration;

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Where and how to reach the flyer rendering service.
#[derive(Clone, Debug)]
pub struct FlyerConfig {
    pub endpoint: String,
    /// Sent as the `apikey` header when the gateway requires one.
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl FlyerConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Reads `CREATOR_FLYER_URL`, `CREATOR_API_KEY` and `CREATOR_HTTP_TIMEOUT_SECS`.
    ///
    /// Returns `None` when no endpoint is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("CREATOR_FLYER_URL").ok()?;
        if endpoint.trim().is_empty() {
            return None;
        }
        let api_key = env::var("CREATOR_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let timeout = env::var("CREATOR_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS), Duration::from_secs);
        Some(Self {
            endpoint: endpoint.trim().to_owned(),
            api_key,
            timeout,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}
