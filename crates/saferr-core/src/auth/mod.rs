//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `Session`: the identity and bearer token returned by login/registration
//! - `AuthState`/`AuthSnapshot`: the shared in-memory session and its change feed
//! - `SessionStore`: login, registration, logout and startup restore
//! - `RouteGuard`: decides whether protected content may be shown
//!
//! Sessions are persisted through `storage::SessionStorage` and expire at the
//! timestamp the server returns; there is no refresh.

pub mod guard;
pub mod session;
pub mod state;
pub mod store;

pub use guard::{GuardState, Guarded, RouteGuard};
pub use session::Session;
pub use state::{AuthSnapshot, AuthState};
pub use store::SessionStore;
