//! Terminal outcomes of a job run

use std::time::Duration;

use crate::domain::job::JobHandle;

/// Everything the caller gets back from a successfully rendered job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub handle: JobHandle,
    pub project_id: Option<String>,
    pub project_url: Option<String>,
    pub video_url: String,
    pub thumbnail_url: String,
    pub final_message: Option<String>,
}

/// Result of one job run
///
/// Exactly one outcome is produced per run. Errors (rejected submission,
/// broken status endpoint, credentials) travel separately as `Err` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The service rendered the video
    Completed(CompletedJob),
    /// The service reported that the job failed
    Failed { handle: JobHandle, reason: String },
    /// The caller did not ask to wait; the job keeps running remotely
    Submitted {
        handle: JobHandle,
        /// Submission response body as the service sent it
        start_response: serde_json::Value,
    },
    /// The configured maximum wait elapsed before a terminal snapshot
    TimedOut { handle: JobHandle, elapsed: Duration },
    /// The caller cancelled while the job was being polled
    Cancelled { handle: JobHandle, elapsed: Duration },
}

impl JobOutcome {
    pub fn handle(&self) -> &JobHandle {
        match self {
            Self::Completed(job) => &job.handle,
            Self::Failed { handle, .. }
            | Self::Submitted { handle, .. }
            | Self::TimedOut { handle, .. }
            | Self::Cancelled { handle, .. } => handle,
        }
    }

    /// Short machine-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "success",
            Self::Failed { .. } => "failed",
            Self::Submitted { .. } => "submitted",
            Self::TimedOut { .. } => "timed_out",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
