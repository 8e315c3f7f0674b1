//! REST API module for the SAFERR backend.
//!
//! This module provides the `ApiClient` gateway through which every call
//! passes, and typed methods for the brand, product, code, subscription and
//! reporting endpoints.
//!
//! Authenticated calls carry a bearer token obtained from `/auth/login` or
//! `/auth/register`.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, RequestOptions, NO_BODY};
pub use endpoints::{default_trend_window, DEFAULT_SUSPICIOUS_LIMIT, MAX_CODES_PER_REQUEST};
pub use error::ApiError;
