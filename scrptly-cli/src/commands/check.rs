//! Check command handler

use anyhow::{Context, Result, bail};
use colored::*;

use crate::config::Config;

/// Handle `scrptly check`
pub async fn handle_check(config: &Config) -> Result<()> {
    let lifecycle = config.lifecycle_client()?;

    let info = match lifecycle.gateway().verify_credentials().await {
        Ok(info) => info,
        Err(e) if e.is_auth() => {
            bail!("{}; check --api-key or SCRPTLY_API_KEY", e)
        }
        Err(e) => return Err(e).context("Credential check failed"),
    };

    println!("{}", "✓ API key accepted".green().bold());
    if let Ok(pretty) = serde_json::to_string_pretty(&info) {
        println!("{}", pretty.dimmed());
    }

    Ok(())
}
