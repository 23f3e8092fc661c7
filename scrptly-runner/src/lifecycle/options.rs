//! Per-run options and retry policy

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Exponential backoff for transient polling failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive transient failures tolerated before giving up
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy that surfaces the first failure
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling up to `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// How a single `run_job` call should behave after submission
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Poll until a terminal state; `false` returns right after submission
    pub wait: bool,
    pub poll_interval: Duration,
    /// Bound on total time since submission
    pub max_wait: Option<Duration>,
    /// Observed only between polls, never mid-request
    pub cancel: Option<CancellationToken>,
    pub retry: RetryPolicy,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            wait: true,
            poll_interval: config.poll_interval,
            max_wait: config.max_wait,
            cancel: None,
            retry: config.poll_retry,
        }
    }

    pub fn no_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
