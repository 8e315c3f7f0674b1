use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::RegisterRequest;
use crate::storage::StoredSession;

use super::{AuthSnapshot, RouteGuard, Session};

/// Single source of truth for who is signed in.
///
/// The in-memory session, the persisted copy and the gateway token are
/// updated together; login and registration report failure as `false`
/// instead of an error.
pub struct SessionStore {
    api: Arc<ApiClient>,
    last_error: Mutex<Option<String>>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            last_error: Mutex::new(None),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Restore a persisted session. Runs once; later calls are no-ops.
    pub async fn initialize(&self) {
        let state = self.api.auth_state();
        if !state.is_initializing() {
            return;
        }

        let restored = match self.api.storage().load() {
            StoredSession::Absent => {
                debug!("No persisted session");
                None
            }
            StoredSession::Corrupt(reason) => {
                warn!(reason = %reason, "Discarding unreadable persisted session");
                self.api.clear_auth_token();
                None
            }
            StoredSession::Present(session) if session.is_expired() => {
                info!(expired_at = %session.expiration, "Persisted session expired");
                self.api.clear_auth_token();
                None
            }
            StoredSession::Present(session) => {
                debug!(
                    username = %session.username,
                    minutes_left = session.minutes_until_expiry(),
                    "Session restored"
                );
                self.api.set_auth_token(session.token.clone());
                Some(session)
            }
        };

        state.finish_initializing(restored);
    }

    /// Sign in with username and password. Returns whether it succeeded.
    pub async fn login(&self, username: &str, password: &str) -> bool {
        let result = self.api.authenticate(username, password).await;
        self.complete("Login", result)
    }

    /// Register a new owner account and brand, signing in on success
    pub async fn register(&self, username: &str, email: &str, password: &str, brand_name: &str) -> bool {
        let request = RegisterRequest {
            username,
            email,
            password,
            brand_name,
        };
        let result = self.api.register(&request).await;
        self.complete("Registration", result)
    }

    fn complete(&self, action: &str, result: Result<Session, ApiError>) -> bool {
        match result {
            Ok(session) if session.token.is_empty() => {
                error!(action = action, "Server returned a session without a token");
                self.set_last_error(Some(format!("{} failed: invalid server response", action)));
                false
            }
            Ok(session) => {
                info!(action = action, username = %session.username, brand = %session.brand_name, "Signed in");
                self.establish(session);
                self.set_last_error(None);
                true
            }
            Err(e) => {
                error!(action = action, error = %e, "Authentication failed");
                self.set_last_error(Some(Self::failure_message(action, &e)));
                false
            }
        }
    }

    /// Write-through: persist, hand the token to the gateway, publish.
    ///
    /// Persisting is best-effort. If the durable write fails the session
    /// still goes live for this process and the next start finds no record.
    fn establish(&self, session: Session) {
        if let Err(e) = self.api.storage().save(&session) {
            warn!(error = %e, "Failed to persist session");
        }
        self.api.set_auth_token(session.token.clone());
        self.api.auth_state().set_session(session);
    }

    fn failure_message(action: &str, err: &ApiError) -> String {
        match err {
            ApiError::Unauthorized(_) => "Invalid username or password".to_string(),
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            other => match other.server_message() {
                Some(message) => message,
                None => format!("{} failed: {}", action, other),
            },
        }
    }

    /// Sign out: memory, persisted copy and gateway token are all cleared.
    /// Navigation is up to whoever observes the change.
    pub fn logout(&self) {
        self.api.clear_auth_token();
        if self.api.auth_state().clear_session() {
            info!("Signed out");
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.api.auth_state().snapshot().session
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.auth_state().snapshot().is_authenticated()
    }

    /// True until `initialize` has finished
    pub fn is_loading(&self) -> bool {
        self.api.auth_state().is_initializing()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.api.auth_state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.api.auth_state().subscribe()
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.subscribe())
    }

    /// User-facing message from the last failed login or registration
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_last_error(&self, message: Option<String>) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, SessionStorage, SESSION_KEY, TOKEN_KEY};
    use chrono::{Duration, Utc};

    fn store_with(entries: &[(&str, &str)]) -> (SessionStore, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::with_entries(entries));
        let storage = SessionStorage::new(memory.clone());
        let api = ApiClient::new("http://127.0.0.1:9/api", std::time::Duration::from_secs(1), storage)
            .unwrap();
        (SessionStore::new(Arc::new(api)), memory)
    }

    fn session(token: &str, expires_in: Duration) -> Session {
        Session {
            token: token.to_string(),
            expiration: Utc::now() + expires_in,
            user_id: "u1".to_string(),
            username: "brand1".to_string(),
            brand_id: "b1".to_string(),
            brand_name: "Acme".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initialize_without_persisted_session() {
        let (store, memory) = store_with(&[]);
        assert!(store.is_loading());
        store.initialize().await;

        assert!(!store.is_loading());
        assert!(!store.is_authenticated());
        assert!(store.session().is_none());
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_restores_valid_session() {
        let s = session("abc", Duration::hours(1));
        let record = serde_json::to_string(&s).unwrap();
        let (store, _memory) = store_with(&[(TOKEN_KEY, "abc"), (SESSION_KEY, record.as_str())]);
        store.initialize().await;

        assert!(store.is_authenticated());
        assert_eq!(store.session(), Some(s));
        assert_eq!(store.api().token().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_initialize_clears_expired_session() {
        let record = r#"{"token":"abc","expiration":"2000-01-01T00:00:00Z","userId":"u1","username":"brand1","brandId":"b1","brandName":"Acme"}"#;
        let (store, memory) = store_with(&[(TOKEN_KEY, "abc"), (SESSION_KEY, record)]);
        store.initialize().await;

        assert!(!store.is_loading());
        assert!(store.session().is_none());
        assert!(memory.is_empty());
        assert_eq!(store.api().token(), None);
    }

    #[tokio::test]
    async fn test_initialize_clears_corrupt_session() {
        let (store, memory) = store_with(&[(TOKEN_KEY, "abc"), (SESSION_KEY, "{{{")]);
        store.initialize().await;

        assert!(!store.is_loading());
        assert!(store.session().is_none());
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let (store, memory) = store_with(&[]);
        store.initialize().await;

        // A session persisted after startup is not picked up by a second call
        let record = serde_json::to_string(&session("late", Duration::hours(1))).unwrap();
        memory
            .set_all(&[(TOKEN_KEY, "late"), (SESSION_KEY, record.as_str())])
            .unwrap();
        store.initialize().await;
        assert!(store.session().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (store, memory) = store_with(&[]);
        store.initialize().await;
        store.establish(session("xyz", Duration::hours(1)));
        assert!(store.is_authenticated());
        assert_eq!(memory.len(), 2);

        store.logout();
        assert!(!store.is_authenticated());
        assert!(store.session().is_none());
        assert!(memory.is_empty());
        assert_eq!(store.api().token(), None);
    }

    #[tokio::test]
    async fn test_login_transport_failure_returns_false() {
        let (store, memory) = store_with(&[]);
        store.initialize().await;

        assert!(!store.login("brand1", "pw").await);
        assert!(store.session().is_none());
        assert!(memory.is_empty());
        assert!(store.last_error().is_some());
    }

    #[test]
    fn test_failure_message_for_bad_credentials() {
        let err = ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(
            SessionStore::failure_message("Login", &err),
            "Invalid username or password"
        );

        let err = ApiError::from_status(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"message":"Username already taken"}"#,
        );
        assert_eq!(
            SessionStore::failure_message("Registration", &err),
            "Username already taken"
        );
    }
}
