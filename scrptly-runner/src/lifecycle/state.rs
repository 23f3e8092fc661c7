//! Lifecycle phases of a single job run

use tracing::debug;

use scrptly_core::domain::job::TaskId;

/// Where a `run_job` call currently is
///
/// ```text
/// Idle -> Submitting -> Submitted -> Polling -> Completed | Failed | TimedOut | Cancelled
///                    \-> SubmitFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Idle,
    Submitting,
    Submitted,
    SubmitFailed,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl LifecyclePhase {
    /// Phases no run ever leaves
    ///
    /// `Submitted` is terminal only for runs that do not wait, so it is not
    /// listed here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SubmitFailed | Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }

    pub fn can_advance_to(&self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;

        matches!(
            (self, next),
            (Idle, Submitting)
                | (Submitting, Submitted)
                | (Submitting, SubmitFailed)
                | (Submitted, Polling)
                | (Polling, Completed)
                | (Polling, Failed)
                | (Polling, TimedOut)
                | (Polling, Cancelled)
        )
    }
}

/// Tracks the phase of one run and logs every transition
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    phase: LifecyclePhase,
}

impl PhaseTracker {
    pub(crate) fn new() -> Self {
        Self {
            phase: LifecyclePhase::Idle,
        }
    }

    pub(crate) fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub(crate) fn advance(&mut self, next: LifecyclePhase, task_id: Option<&TaskId>) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal lifecycle transition {:?} -> {:?}",
            self.phase,
            next
        );

        match task_id {
            Some(task_id) => debug!(%task_id, from = ?self.phase, to = ?next, "Lifecycle transition"),
            None => debug!(from = ?self.phase, to = ?next, "Lifecycle transition"),
        }

        self.phase = next;
    }
}
