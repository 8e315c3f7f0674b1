use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - session may be expired")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited(String),

    #[error("Server error ({status}): {body}")]
    ServerError { status: StatusCode, body: String },

    #[error("Request failed ({status}): {body}")]
    Status { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    Validation(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited(truncated),
            500..=599 => ApiError::ServerError { status, body: truncated },
            _ => ApiError::Status { status, body: truncated },
        }
    }

    /// HTTP status of the response, if one was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::AccessDenied(_) => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::RateLimited(_) => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::ServerError { status, .. } | ApiError::Status { status, .. } => {
                Some(*status)
            }
            ApiError::Network(e) => e.status(),
            ApiError::InvalidResponse(_) | ApiError::Validation(_) => None,
        }
    }

    /// Server-provided error body, if any
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::RateLimited(body)
            | ApiError::ServerError { body, .. }
            | ApiError::Status { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Extract the message the backend put in its error body.
    ///
    /// Problem-details bodies carry `title`, application errors carry
    /// `message`; a plain-text body is returned as-is.
    pub fn server_message(&self) -> Option<String> {
        let body = self.body()?.trim();
        if body.is_empty() {
            return None;
        }
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value) => ["title", "message"].iter().find_map(|key| {
                value
                    .get(key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            }),
            Err(_) => Some(body.to_string()),
        }
    }

    /// Short message suitable for a status line
    pub fn user_message(&self) -> String {
        if let Some(message) = self.server_message() {
            return message;
        }
        match self {
            ApiError::Unauthorized(_) => "Session expired. Please log in again.".to_string(),
            ApiError::AccessDenied(_) => "You do not have access to this resource.".to_string(),
            ApiError::NotFound(_) => "Not found.".to_string(),
            ApiError::RateLimited(_) => {
                "Server is busy. Please wait a moment and try again.".to_string()
            }
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => "Unable to connect to server.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_taxonomy() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(_)
        ));
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, "").is_not_found());
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError { .. }
        ));
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "bad");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.body(), Some("bad"));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, &long);
        let body = err.body().unwrap();
        assert!(body.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(body.contains("truncated, 520 total bytes"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, &long);
        assert!(err.body().unwrap().contains("truncated"));
    }

    #[test]
    fn test_server_message_prefers_title() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"title":"One or more validation errors occurred.","message":"ignored"}"#,
        );
        assert_eq!(
            err.server_message().as_deref(),
            Some("One or more validation errors occurred.")
        );

        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Monthly code quota exceeded"}"#,
        );
        assert_eq!(err.user_message(), "Monthly code quota exceeded");
    }

    #[test]
    fn test_server_message_plain_text_and_empty() {
        let err = ApiError::from_status(StatusCode::CONFLICT, "Product already exists");
        assert_eq!(err.server_message().as_deref(), Some("Product already exists"));

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.server_message(), None);
        assert_eq!(err.user_message(), "Not found.");
    }
}
