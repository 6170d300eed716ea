//! Error types for the task API client.
//!
//! # Design
//! Non-2xx responses are not split by status: every one lands in `Http`
//! with the message extracted from the response. `Display` for `Http` is the
//! bare message so callers can show it to a user as-is.

use thiserror::Error;

/// Errors returned by the dispatcher and everything built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status outside 200-299.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request could not complete (DNS, connection, malformed response).
    #[error("transport error: {0}")]
    Transport(String),

    /// A success response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Base address and endpoint did not form a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status of an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}
