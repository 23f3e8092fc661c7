//! Progress observations emitted while a job is pending

use std::time::Duration;
use tracing::info;

use scrptly_core::domain::job::TaskId;

/// One pending snapshot, as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub task_id: TaskId,
    /// Server-supplied progress text, if any
    pub message: Option<String>,
    /// Time since submission
    pub elapsed: Duration,
    /// Number of polls issued so far, including this one
    pub poll_count: u32,
}

/// Receives progress observations
///
/// Called from the polling task between polls; implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Logs progress through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        info!(
            task_id = %event.task_id,
            elapsed_secs = event.elapsed.as_secs(),
            poll = event.poll_count,
            "Job still rendering: {}",
            event.message.as_deref().unwrap_or("no status message")
        );
    }
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
