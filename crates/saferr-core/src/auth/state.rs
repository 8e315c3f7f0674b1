use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::Session;

/// Point-in-time view of the authentication state
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    /// True until the startup session check has finished
    pub initializing: bool,
}

impl AuthSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// Derived on every call from the session and the clock; never stored
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.session
            .as_ref()
            .map(|s| s.is_valid_at(now))
            .unwrap_or(false)
    }
}

/// In-memory session shared by the session store and the gateway.
///
/// Every change is published to subscribers (route guards).
#[derive(Clone)]
pub struct AuthState {
    tx: Arc<watch::Sender<AuthSnapshot>>,
}

impl AuthState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot {
            session: None,
            initializing: true,
        });
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    pub fn is_initializing(&self) -> bool {
        self.tx.borrow().initializing
    }

    pub fn set_session(&self, session: Session) {
        self.tx.send_modify(|state| state.session = Some(session));
    }

    /// Drop the in-memory session. Returns whether one was present.
    pub fn clear_session(&self) -> bool {
        self.tx.send_if_modified(|state| state.session.take().is_some())
    }

    /// Settle the startup check, restoring `session` if one was recovered
    pub fn finish_initializing(&self, session: Option<Session>) {
        self.tx.send_modify(|state| {
            if session.is_some() {
                state.session = session;
            }
            state.initializing = false;
        });
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}
