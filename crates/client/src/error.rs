//! Error types for the Monarch client.

use crate::config::RETRYABLE_STATUSES;
use serde::{Deserialize, Serialize};

/// Result type for client operations.
pub type MonarchResult<T> = Result<T, MonarchError>;

/// Error types that can occur when talking to the Monarch API.
#[derive(Debug, thiserror::Error)]
pub enum MonarchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// GraphQL response carried an `errors` array.
    #[error("GraphQL error in {operation}: {}", messages.join("; "))]
    GraphQl {
        operation: String,
        messages: Vec<String>,
    },

    /// Login was rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The account requires a multi-factor code and none was supplied.
    #[error("Multi-factor authentication is required")]
    MfaRequired,

    /// A request that needs a session token was made without one.
    #[error("Client is not authenticated")]
    NotAuthenticated,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session artifact could not be read or written.
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// One-time code could not be generated from the MFA secret.
    #[error("TOTP error: {0}")]
    Totp(String),
}

impl MonarchError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }

    /// Check if this error means the session token is no longer usable.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Authentication(_) | Self::MfaRequired | Self::NotAuthenticated => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorResponse>(body) {
            Ok(ErrorResponse {
                detail: Some(detail),
                ..
            }) => detail,
            Ok(ErrorResponse {
                error: Some(error), ..
            }) => error,
            _ => body.to_string(),
        };

        Self::Api { status, message }
    }
}

/// Error body returned by Monarch's REST endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
