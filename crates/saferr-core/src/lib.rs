//! Core library for the SAFERR brand console.
//!
//! - `api`: the shared HTTP gateway (`ApiClient`) and typed SAFERR endpoints
//! - `auth`: session data, the session store and the route guard
//! - `storage`: durable key-value storage backing the persisted session
//! - `models`: wire models for brands, products, subscriptions and reports
//! - `config`: application configuration and directory resolution

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use auth::{AuthSnapshot, Guarded, GuardState, RouteGuard, Session, SessionStore};
pub use config::Config;
pub use storage::{FileStore, KeyValueStore, MemoryStore, SessionStorage};
