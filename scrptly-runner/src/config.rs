//! Lifecycle configuration
//!
//! Defines all configurable parameters of the job lifecycle client including
//! endpoints, polling intervals, wait bounds and malformed-snapshot tolerance.

use scrptly_client::DEFAULT_API_URL;
use scrptly_core::dto::job::ApiFlavor;
use std::time::Duration;

use crate::lifecycle::RetryPolicy;

/// Host used to derive status endpoints when the service does not return one
pub const DEFAULT_STATUS_BASE_URL: &str = "https://scrptly.com";

/// Lifecycle client configuration
///
/// All intervals and bounds are configurable to allow tuning for different
/// deployments (interactive CLI vs unattended batch runs).
#[derive(Debug, Clone)]
pub struct Config {
    /// Generation API base URL (e.g., "https://api.scrptly.com")
    pub api_url: String,

    /// Base URL for derived `/task-status/<id>` endpoints
    pub status_base_url: String,

    /// Wire dialect used for submissions
    pub api_flavor: ApiFlavor,

    /// Delay between status polls
    pub poll_interval: Duration,

    /// Upper bound on total wait since submission; `None` waits forever
    pub max_wait: Option<Duration>,

    /// Consecutive unparseable snapshots tolerated before polling fails
    pub max_malformed_snapshots: u32,

    /// Maximum number of context images per job
    pub max_context_images: usize,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Retry policy for transient failures while polling
    pub poll_retry: RetryPolicy,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            status_base_url: DEFAULT_STATUS_BASE_URL.to_string(),
            api_flavor: ApiFlavor::Classic,
            poll_interval: Duration::from_secs(15),
            max_wait: None,
            max_malformed_snapshots: 3,
            max_context_images: 10,
            request_timeout: Duration::from_secs(30),
            poll_retry: RetryPolicy::default(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - SCRPTLY_API_URL (default: https://api.scrptly.com)
    /// - SCRPTLY_STATUS_URL (default: https://scrptly.com)
    /// - SCRPTLY_API_FLAVOR (classic | events, default: classic)
    /// - SCRPTLY_POLL_INTERVAL (seconds, default: 15)
    /// - SCRPTLY_MAX_WAIT (seconds, default: unbounded)
    /// - SCRPTLY_MAX_MALFORMED (default: 3)
    /// - SCRPTLY_MAX_CONTEXT_IMAGES (default: 10)
    /// - SCRPTLY_REQUEST_TIMEOUT (seconds, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seconds = |key: &str| -> anyhow::Result<Option<Duration>> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(|secs| Some(Duration::from_secs(secs)))
                    .map_err(|_| anyhow::anyhow!("{} must be a whole number of seconds", key)),
                None => Ok(None),
            }
        };

        let mut config = Self::new(
            lookup("SCRPTLY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        );

        if let Some(url) = lookup("SCRPTLY_STATUS_URL") {
            config.status_base_url = url;
        }

        if let Some(flavor) = lookup("SCRPTLY_API_FLAVOR") {
            config.api_flavor = flavor.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        }

        if let Some(interval) = seconds("SCRPTLY_POLL_INTERVAL")? {
            config.poll_interval = interval;
        }

        config.max_wait = seconds("SCRPTLY_MAX_WAIT")?;

        if let Some(raw) = lookup("SCRPTLY_MAX_MALFORMED") {
            config.max_malformed_snapshots = raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("SCRPTLY_MAX_MALFORMED must be a number"))?;
        }

        if let Some(raw) = lookup("SCRPTLY_MAX_CONTEXT_IMAGES") {
            config.max_context_images = raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("SCRPTLY_MAX_CONTEXT_IMAGES must be a number"))?;
        }

        if let Some(timeout) = seconds("SCRPTLY_REQUEST_TIMEOUT")? {
            config.request_timeout = timeout;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, url) in [
            ("api_url", &self.api_url),
            ("status_base_url", &self.status_base_url),
        ] {
            if url.is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }

            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_wait.is_some_and(|max_wait| max_wait.is_zero()) {
            anyhow::bail!("max_wait must be greater than 0 when set");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL.to_string())
    }
}
