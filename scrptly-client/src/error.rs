//! Error types for the Scrptly client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the Scrptly API
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Credential missing, empty, or rejected by the service (401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network-level failure: connect, TLS, timeout, broken body stream
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// API returned a non-success status code other than 401/403
    #[error("API error (status {status}): {body}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create a remote error from status code and body
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is an authentication error
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
