//! Client session: bearer token storage and expiry notification

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// Where the bearer token lives
pub trait TokenStore: Send + Sync {
    /// Current token, if any
    fn get(&self) -> Option<String>;
    /// Replace the token
    fn set(&self, token: String);
    /// Forget the token
    fn clear(&self);
}

/// Token store held in process memory
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Create a store holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: String) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Notified when the backend rejects the session
pub trait SessionListener: Send + Sync {
    /// The token has been cleared; the user should be sent to `login_route`
    fn session_expired(&self, login_route: &str);
}

/// Listener that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogListener;

impl SessionListener for LogListener {
    fn session_expired(&self, login_route: &str) {
        warn!(login_route = %login_route, "Session expired, sign-in required");
    }
}

/// Explicit client context carrying the token and the expiry listener
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    listener: Arc<dyn SessionListener>,
    login_route: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("login_route", &self.login_route)
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOGIN_ROUTE)
    }
}

impl Session {
    /// Anonymous session with an in-memory store and a logging listener
    pub fn new(login_route: impl Into<String>) -> Self {
        Self {
            store: Arc::new(MemoryTokenStore::default()),
            listener: Arc::new(LogListener),
            login_route: login_route.into(),
        }
    }

    /// Builder-style method to start with a token
    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.store.set(token.into());
        self
    }

    /// Builder-style method to use a custom token store
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = store;
        self
    }

    /// Builder-style method to use a custom expiry listener
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Current token
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    /// Store a token after sign-in
    pub fn set_token(&self, token: impl Into<String>) {
        self.store.set(token.into());
        info!("Session token updated");
    }

    /// Sign out
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Whether a token is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.store.get().is_some()
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.store
            .get()
            .filter(|token| !token.is_empty())
            .map(|token| format!("Bearer {token}"))
    }

    /// Route the listener is pointed to on expiry
    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Clear the token and notify the listener once
    pub fn expire(&self) {
        self.store.clear();
        self.listener.session_expired(&self.login_route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingListener;

    #[test]
    fn test_bearer_header() {
        let session = Session::default();
        assert_eq!(session.bearer(), None);

        session.set_token("abc123");
        assert_eq!(session.bearer().as_deref(), Some("Bearer abc123"));
    }

    #[test]
    fn test_expire_clears_and_notifies() {
        let listener = Arc::new(RecordingListener::default());
        let session = Session::new("/auth")
            .with_token("abc")
            .with_listener(listener.clone());

        session.expire();

        assert!(!session.is_authenticated());
        assert_eq!(listener.expirations(), 1);
        assert_eq!(listener.last_route().as_deref(), Some("/auth"));
    }

    #[test]
    fn test_clones_share_store() {
        let session = Session::default();
        let clone = session.clone();
        clone.set_token("shared");
        assert_eq!(session.token().as_deref(), Some("shared"));
    }
}
