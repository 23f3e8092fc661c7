//! Configuration module
//!
//! Combines lifecycle settings from the environment with command-line
//! overrides and the API key.

use anyhow::{Context, Result};
use scrptly_client::StaticToken;
use scrptly_runner::JobLifecycleClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Lifecycle client settings
    pub lifecycle: scrptly_runner::Config,

    /// API key sent as bearer token
    pub api_key: Option<String>,
}

impl Config {
    /// Builds the lifecycle client, failing early when no API key is available
    pub fn lifecycle_client(&self) -> Result<JobLifecycleClient> {
        let api_key = self
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .context("API key required: pass --api-key or set SCRPTLY_API_KEY")?;

        self.lifecycle
            .validate()
            .context("Invalid configuration")?;

        JobLifecycleClient::from_config(self.lifecycle.clone(), StaticToken::new(api_key))
            .context("Failed to initialize Scrptly client")
    }
}
