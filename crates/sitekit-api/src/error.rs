//! Fetch client error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error code used when the request never produced an HTTP response
pub const ERROR_CODE_FETCH: &str = "fetch_error";
/// Error code used for non-2xx responses whose body is not an error object
pub const ERROR_CODE_HTTP: &str = "http_error";
/// Error code used when a 2xx body cannot be decoded
pub const ERROR_CODE_INVALID_JSON: &str = "invalid_json";
/// Error code used when a descriptor path is not a known route
pub const ERROR_CODE_UNKNOWN_ENDPOINT: &str = "unknown_endpoint";

/// Errors raised while building a client
#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid proxy configuration
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// Client build error
    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),
}

/// `data` member of a WordPress-style error object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Any further server-provided fields, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Error returned by every fetch. Mirrors the server's
/// `{code, message, data: {status}}` object and is never localized here.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} ({code})")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub data: ApiErrorData,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: ApiErrorData {
                status,
                extra: serde_json::Map::new(),
            },
        }
    }

    /// HTTP status reported by the server, if any
    pub fn status(&self) -> Option<u16> {
        self.data.status
    }

    pub fn fetch_error(message: impl Into<String>) -> Self {
        Self::new(ERROR_CODE_FETCH, message, None)
    }

    pub fn unknown_endpoint(path: &str) -> Self {
        Self::new(
            ERROR_CODE_UNKNOWN_ENDPOINT,
            format!("No route matches path: {path}"),
            None,
        )
    }

    /// Build the error for a non-2xx response. A body that is a valid error
    /// object is passed through untouched.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        if let Ok(mut error) = serde_json::from_str::<ApiError>(body) {
            if error.data.status.is_none() {
                error.data.status = Some(status);
            }
            return error;
        }

        Self::new(
            ERROR_CODE_HTTP,
            reason.unwrap_or("Unknown error").to_string(),
            Some(status),
        )
    }
}

impl From<HttpError> for ApiError {
    fn from(error: HttpError) -> Self {
        ApiError::fetch_error(error.to_string())
    }
}
