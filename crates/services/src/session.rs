use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use creator_core::Clock;
use creator_core::model::{AuthState, AuthToken, Session};
use tokio::sync::watch;
use tracing::info;

/// Source of the signed-in session.
///
/// Consumers only read from it; signing in and out belongs to the provider.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The current session, or `None` when signed out or expired.
    async fn current_session(&self) -> Option<Session>;

    /// Receiver notified whenever the auth state changes.
    fn subscribe(&self) -> watch::Receiver<AuthState>;

    async fn token(&self) -> Option<AuthToken> {
        self.current_session().await.map(|session| session.access_token)
    }
}

/// In-process session store with sign-in, sign-out and token rotation.
pub struct MemorySessionProvider {
    clock: Clock,
    session: Mutex<Option<Session>>,
    auth: watch::Sender<AuthState>,
}

impl MemorySessionProvider {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        let (auth, _) = watch::channel(AuthState::SignedOut);
        Self {
            clock,
            session: Mutex::new(None),
            auth,
        }
    }

    pub fn sign_in(&self, session: Session) {
        let owner = session.owner.clone();
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
        info!(%owner, "signed in");
        self.auth.send_replace(AuthState::SignedIn(owner));
    }

    pub fn sign_out(&self) {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            info!("signed out");
        }
        self.auth.send_replace(AuthState::SignedOut);
    }

    /// Swap the access token of the current session. Returns `false` when signed out.
    pub fn rotate_token(&self, token: AuthToken) -> bool {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(session) => {
                session.access_token = token;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn current_session(&self) -> Option<Session> {
        let guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|session| !session.is_expired(self.clock.now()))
            .cloned()
    }

    fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use creator_core::model::OwnerHandle;
    use creator_core::time::{fixed_clock, fixed_now};

    fn session(token: &str) -> Session {
        Session::new(OwnerHandle::parse("nova").unwrap(), AuthToken::new(token))
    }

    #[tokio::test]
    async fn sign_in_and_out_are_broadcast() {
        let provider = MemorySessionProvider::new(fixed_clock());
        let rx = provider.subscribe();
        assert_eq!(*rx.borrow(), AuthState::SignedOut);

        provider.sign_in(session("t1"));
        assert_eq!(
            *rx.borrow(),
            AuthState::SignedIn(OwnerHandle::parse("nova").unwrap())
        );
        assert_eq!(provider.token().await, Some(AuthToken::new("t1")));

        provider.sign_out();
        assert_eq!(*rx.borrow(), AuthState::SignedOut);
        assert!(provider.current_session().await.is_none());
    }

    #[tokio::test]
    async fn expired_session_yields_no_token() {
        let provider = MemorySessionProvider::new(fixed_clock());
        provider.sign_in(session("t1").expiring_at(fixed_now() - Duration::seconds(1)));
        assert!(provider.token().await.is_none());
    }

    #[tokio::test]
    async fn rotation_replaces_token_for_next_read() {
        let provider = MemorySessionProvider::new(fixed_clock());
        assert!(!provider.rotate_token(AuthToken::new("nope")));

        provider.sign_in(session("t1"));
        assert!(provider.rotate_token(AuthToken::new("t2")));
        assert_eq!(provider.token().await, Some(AuthToken::new("t2")));
    }
}
