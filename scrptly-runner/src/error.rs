//! Error taxonomy of the job lifecycle
//!
//! Every variant aborts the single job it was raised for. Timeouts and
//! cancellations are not errors; they are [`JobOutcome`] variants.
//!
//! [`JobOutcome`]: scrptly_core::domain::outcome::JobOutcome

use scrptly_client::ClientError;
use scrptly_core::domain::job::SpecError;
use thiserror::Error;

/// Result type alias for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

#[derive(Debug, Clone, Error)]
pub enum LifecycleError {
    /// Credential missing or rejected; never retried
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network-level failure that outlived the retry policy
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Unexpected non-2xx response while polling
    #[error("API error (status {status}): {body}")]
    Remote { status: u16, body: String },

    /// The service did not accept the job
    #[error("Job submission rejected: {reason}")]
    Submission { reason: String },

    /// The status endpoint kept returning garbage, or claimed success
    /// without render output
    #[error("Polling failed: {0}")]
    Poll(String),

    /// The service reported the job as failed
    #[error("Job failed: {reason}")]
    RemoteJobFailure { reason: String },

    /// The job spec was rejected before anything was sent
    #[error("Invalid job spec: {0}")]
    InvalidSpec(#[from] SpecError),

    /// Response that fits no other category
    #[error("Unexpected response: {0}")]
    Protocol(String),
}

impl LifecycleError {
    /// Whether the poll loop may try again after this error
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ClientError> for LifecycleError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Auth(message) => Self::Auth(message),
            ClientError::Transport(message) => Self::Transport(message),
            ClientError::Remote { status, body } => Self::Remote { status, body },
            ClientError::Parse(message) | ClientError::InvalidRequest(message) => {
                Self::Protocol(message)
            }
        }
    }
}
