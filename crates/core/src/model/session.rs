use std::fmt;

use chrono::{DateTime, Utc};

use crate::model::ids::OwnerHandle;

/// Bearer token for the rendering service. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Signed-in creator session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub owner: OwnerHandle,
    pub access_token: AuthToken,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn new(owner: OwnerHandle, access_token: AuthToken) -> Self {
        Self {
            owner,
            access_token,
            expires_at: None,
        }
    }

    #[must_use]
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// A session without an expiry never expires; otherwise it expires at `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Auth lifecycle as broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(OwnerHandle),
}
