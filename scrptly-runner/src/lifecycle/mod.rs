//! Job lifecycle layer
//!
//! Drives a job from submission through polling to a terminal outcome.
//! [`JobLifecycleClient::run_job`] is the high-level entry point;
//! [`JobLifecycleClient::submit_job`] and [`JobLifecycleClient::poll_once`]
//! are available for callers that manage polling themselves.

mod client;
mod options;
mod progress;
mod state;

pub use client::{JobLifecycleClient, JobWatch};
pub use options::{RetryPolicy, RunOptions};
pub use progress::{NoopProgress, ProgressEvent, ProgressSink, TracingProgress};
pub use state::LifecyclePhase;

use scrptly_core::domain::outcome::JobOutcome;

use crate::error::{LifecycleError, Result};

/// Conversions for callers that prefer `?` over matching on outcomes
pub trait OutcomeExt {
    /// Turns a remote job failure into [`LifecycleError::RemoteJobFailure`]
    fn into_result(self) -> Result<JobOutcome>;
}

impl OutcomeExt for JobOutcome {
    fn into_result(self) -> Result<JobOutcome> {
        match self {
            JobOutcome::Failed { reason, .. } => Err(LifecycleError::RemoteJobFailure { reason }),
            other => Ok(other),
        }
    }
}
