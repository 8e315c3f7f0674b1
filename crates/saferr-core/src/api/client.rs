//! HTTP gateway for the SAFERR REST API.
//!
//! Every outbound call goes through `ApiClient`, which attaches the current
//! bearer token and tears down the local session when the server rejects it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use anyhow::Result;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

use crate::auth::AuthState;
use crate::config::Config;
use crate::storage::SessionStorage;

use super::ApiError;

/// Use as the body argument of `post`/`put` when the call sends no body
pub const NO_BODY: Option<&()> = None;

/// Per-call request configuration
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        if !self.headers.is_empty() {
            builder = builder.headers(self.headers.clone());
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }
}

/// The single shared gateway. Construct once and share through `Arc`.
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    storage: SessionStorage,
    auth: AuthState,
}

impl ApiClient {
    /// Create a new gateway talking to `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, storage: SessionStorage) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
                headers
            })
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
            storage,
            auth: AuthState::new(),
        })
    }

    /// Create a gateway from the application configuration
    pub fn from_config(config: &Config, storage: SessionStorage) -> Result<Arc<Self>> {
        let api = Self::new(config.api_base_url(), config.request_timeout(), storage)?;
        debug!(base_url = %api.base_url, "API client configured");
        Ok(Arc::new(api))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// In-memory session state shared with the session store
    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    // ===== Token Management =====

    fn read_token(&self) -> RwLockReadGuard<'_, Option<String>> {
        self.token.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_token(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.token.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Set the bearer token attached to subsequent requests
    pub fn set_auth_token(&self, token: impl Into<String>) {
        *self.write_token() = Some(token.into());
    }

    /// Forget the token and remove the persisted session record
    pub fn clear_auth_token(&self) {
        *self.write_token() = None;
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Token currently held in memory
    pub fn token(&self) -> Option<String> {
        self.read_token().clone()
    }

    /// Token to attach to the next request.
    ///
    /// Falls back to a persisted token when none is held in memory yet, and
    /// adopts it so later calls skip the storage read.
    fn bearer_token(&self) -> Option<String> {
        if let Some(token) = self.read_token().clone() {
            return Some(token);
        }
        let stored = self.storage.token()?;
        debug!("Adopting persisted token");
        let mut slot = self.write_token();
        Some(slot.get_or_insert(stored).clone())
    }

    /// Server rejected the credential: drop it everywhere
    fn handle_unauthorized(&self, url: &str) {
        warn!(url = url, "Unauthorized response - clearing stored credentials");
        self.clear_auth_token();
        self.auth.clear_session();
    }

    // ===== Request Pipeline =====

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(&self, url: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status, &body);
        error!(url = url, status = status.as_u16(), error = %err, "API error");

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(url);
        }
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(payload).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut builder = self.client.request(method.clone(), &url);

        if let Some(token) = self.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(options) = options {
            builder = options.apply(builder);
        }

        debug!(method = %method, url = %url, "Sending request");
        let response = builder.send().await.map_err(|e| {
            error!(url = %url, error = %e, "Request failed");
            ApiError::Network(e)
        })?;

        let response = self.check_response(&url, response).await?;
        Self::decode(&url, response).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, NO_BODY, options).await
    }

    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, body, options).await
    }

    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, body, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, NO_BODY, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, TOKEN_KEY};

    fn client_with(store: MemoryStore) -> ApiClient {
        let storage = SessionStorage::new(Arc::new(store));
        ApiClient::new("http://localhost:5000/api/", Duration::from_secs(10), storage).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let api = client_with(MemoryStore::new());
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(api.url("/brands/my-brand"), "http://localhost:5000/api/brands/my-brand");
        assert_eq!(api.url("reporting/trends"), "http://localhost:5000/api/reporting/trends");
        assert_eq!(api.url("https://other.example/x"), "https://other.example/x");
    }

    #[test]
    fn test_set_and_clear_token() {
        let api = client_with(MemoryStore::new());
        assert_eq!(api.token(), None);
        api.set_auth_token("xyz");
        assert_eq!(api.token().as_deref(), Some("xyz"));
        api.clear_auth_token();
        assert_eq!(api.token(), None);
    }

    #[test]
    fn test_bearer_token_adopts_persisted_token() {
        let api = client_with(MemoryStore::with_entries(&[(TOKEN_KEY, "persisted")]));
        assert_eq!(api.token(), None);
        assert_eq!(api.bearer_token().as_deref(), Some("persisted"));
        assert_eq!(api.token().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_memory_token_wins_over_persisted() {
        let api = client_with(MemoryStore::with_entries(&[(TOKEN_KEY, "persisted")]));
        api.set_auth_token("fresh");
        assert_eq!(api.bearer_token().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new()
            .query("limit", 25)
            .header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("abc"),
            )
            .timeout(Duration::from_secs(3));
        assert_eq!(options.query, vec![("limit".to_string(), "25".to_string())]);
        assert_eq!(options.headers.len(), 1);
        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
    }
}
