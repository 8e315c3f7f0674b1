use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::auth::Session;

use super::KeyValueStore;

/// Key holding the serialized session record
pub const SESSION_KEY: &str = "session";

/// Key holding the raw bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Result of reading the persisted session record
#[derive(Debug, Clone, PartialEq)]
pub enum StoredSession {
    /// Nothing persisted
    Absent,
    /// Something persisted but it cannot be trusted; carries the reason
    Corrupt(String),
    Present(Session),
}

/// Durable copy of the session: the serialized record and the raw token,
/// always written together and cleared together.
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist the session record and its token in one write
    pub fn save(&self, session: &Session) -> Result<()> {
        let record = serde_json::to_string(session).context("Failed to serialize session")?;
        self.store
            .set_all(&[(TOKEN_KEY, session.token.as_str()), (SESSION_KEY, record.as_str())])
            .context("Failed to persist session")?;
        debug!(username = %session.username, "Session persisted");
        Ok(())
    }

    /// Read the persisted raw token, if any
    pub fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        }
    }

    /// Read and validate the persisted session record
    pub fn load(&self) -> StoredSession {
        let record = match self.store.get(SESSION_KEY) {
            Ok(record) => record,
            Err(e) => return StoredSession::Corrupt(format!("unreadable storage: {e:#}")),
        };
        let token = match self.store.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => return StoredSession::Corrupt(format!("unreadable storage: {e:#}")),
        };

        let record = match (record, token.as_deref()) {
            (None, None) => return StoredSession::Absent,
            (None, Some(_)) => {
                return StoredSession::Corrupt("token persisted without a session".to_string())
            }
            (Some(record), _) => record,
        };

        let session: Session = match serde_json::from_str(&record) {
            Ok(session) => session,
            Err(e) => return StoredSession::Corrupt(format!("unparsable session: {e}")),
        };

        if session.token.is_empty() {
            return StoredSession::Corrupt("session has an empty token".to_string());
        }
        match token {
            Some(token) if token == session.token => StoredSession::Present(session),
            Some(_) => StoredSession::Corrupt("token does not match session".to_string()),
            None => StoredSession::Corrupt("session persisted without a token".to_string()),
        }
    }

    /// Remove the session record and its token in one operation
    pub fn clear(&self) -> Result<()> {
        self.store
            .remove_all(&[TOKEN_KEY, SESSION_KEY])
            .context("Failed to clear persisted session")?;
        debug!("Persisted session cleared");
        Ok(())
    }
}
