use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::{AuthSnapshot, Session};

/// Where the guard stands for the current auth state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Startup session check still running; never redirect in this state
    Checking,
    Unauthenticated,
    Authenticated,
}

impl GuardState {
    fn of(snapshot: &AuthSnapshot, now: DateTime<Utc>) -> Self {
        if snapshot.initializing {
            GuardState::Checking
        } else if snapshot.is_authenticated_at(now) {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        }
    }
}

/// Outcome of rendering through the guard
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    /// Loading placeholder while the startup check runs
    Placeholder(T),
    /// Not signed in: navigate to login, render nothing
    Redirect,
    Content(T),
}

impl<T> Guarded<T> {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Guarded::Redirect)
    }

    pub fn into_inner(self) -> Option<T> {
        match self {
            Guarded::Placeholder(v) | Guarded::Content(v) => Some(v),
            Guarded::Redirect => None,
        }
    }
}

/// Wraps protected content, gating it on the session store's state.
///
/// Each protected view holds its own guard; all guards watch the same state.
pub struct RouteGuard {
    rx: watch::Receiver<AuthSnapshot>,
}

impl RouteGuard {
    pub fn new(rx: watch::Receiver<AuthSnapshot>) -> Self {
        Self { rx }
    }

    pub fn state(&self) -> GuardState {
        self.state_at(Utc::now())
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> GuardState {
        GuardState::of(&self.rx.borrow(), now)
    }

    /// Render protected content, or the placeholder while the check is pending
    pub fn render<T>(
        &self,
        placeholder: impl FnOnce() -> T,
        content: impl FnOnce(&Session) -> T,
    ) -> Guarded<T> {
        self.render_at(Utc::now(), placeholder, content)
    }

    pub fn render_at<T>(
        &self,
        now: DateTime<Utc>,
        placeholder: impl FnOnce() -> T,
        content: impl FnOnce(&Session) -> T,
    ) -> Guarded<T> {
        // Clone out of the channel so callbacks never run under its lock
        let snapshot = self.rx.borrow().clone();
        match (GuardState::of(&snapshot, now), snapshot.session) {
            (GuardState::Checking, _) => Guarded::Placeholder(placeholder()),
            (GuardState::Authenticated, Some(session)) => Guarded::Content(content(&session)),
            _ => Guarded::Redirect,
        }
    }

    /// Wait for the next auth change and return the re-evaluated state.
    /// If the session store is gone the current state is returned.
    pub async fn changed(&mut self) -> GuardState {
        let _ = self.rx.changed().await;
        self.state()
    }

    /// Wait until the startup check has settled
    pub async fn ready(&mut self) -> GuardState {
        let _ = self.rx.wait_for(|snapshot| !snapshot.initializing).await;
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        Session {
            token: "xyz".to_string(),
            expiration: Utc::now() + expires_in,
            user_id: "u1".to_string(),
            username: "brand1".to_string(),
            brand_id: "b1".to_string(),
            brand_name: "Acme".to_string(),
        }
    }

    fn render(guard: &RouteGuard) -> Guarded<String> {
        guard.render(|| "loading".to_string(), |s| format!("hello {}", s.brand_name))
    }

    #[test]
    fn test_placeholder_while_checking() {
        let state = AuthState::new();
        // Even a present session shows the placeholder until the check settles
        state.set_session(session(Duration::hours(1)));
        let guard = RouteGuard::new(state.subscribe());

        assert_eq!(guard.state(), GuardState::Checking);
        assert_eq!(render(&guard), Guarded::Placeholder("loading".to_string()));
    }

    #[test]
    fn test_redirect_when_unauthenticated() {
        let state = AuthState::new();
        state.finish_initializing(None);
        let guard = RouteGuard::new(state.subscribe());

        assert_eq!(guard.state(), GuardState::Unauthenticated);
        assert!(render(&guard).is_redirect());
        assert_eq!(render(&guard).into_inner(), None);
    }

    #[test]
    fn test_content_when_authenticated() {
        let state = AuthState::new();
        state.finish_initializing(Some(session(Duration::hours(1))));
        let guard = RouteGuard::new(state.subscribe());

        assert_eq!(render(&guard), Guarded::Content("hello Acme".to_string()));
    }

    #[test]
    fn test_expiry_redirects_without_state_change() {
        let state = AuthState::new();
        let s = session(Duration::minutes(5));
        let expiration = s.expiration;
        state.finish_initializing(Some(s));
        let guard = RouteGuard::new(state.subscribe());

        assert_eq!(guard.state_at(expiration - Duration::seconds(1)), GuardState::Authenticated);
        assert_eq!(guard.state_at(expiration), GuardState::Unauthenticated);
        assert!(guard
            .render_at(expiration, || (), |_| ())
            .is_redirect());
    }

    #[tokio::test]
    async fn test_reevaluates_after_session_cleared() {
        let state = AuthState::new();
        state.finish_initializing(Some(session(Duration::hours(1))));
        let mut guard = RouteGuard::new(state.subscribe());
        assert_eq!(guard.state(), GuardState::Authenticated);

        let clearer = state.clone();
        tokio::spawn(async move {
            clearer.clear_session();
        });
        assert_eq!(guard.changed().await, GuardState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_ready_waits_for_startup_check() {
        let state = AuthState::new();
        let mut guard = RouteGuard::new(state.subscribe());

        let finisher = state.clone();
        tokio::spawn(async move {
            finisher.finish_initializing(None);
        });
        assert_eq!(guard.ready().await, GuardState::Unauthenticated);
    }
}
