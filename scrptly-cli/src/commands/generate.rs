//! Generate command handler
//!
//! Submits one job and, unless told otherwise, waits for the video.

use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use scrptly_core::domain::job::{ContextImage, DEFAULT_APPROVAL_BUDGET, JobSpec};
use scrptly_core::domain::outcome::JobOutcome;
use scrptly_runner::{OutcomeExt, RunOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::output::{ConsoleProgress, print_outcome};

/// Arguments of `scrptly generate`
#[derive(Args)]
pub struct GenerateArgs {
    /// Text prompt describing the video
    prompt: String,

    /// Context image, optionally with a description (repeatable)
    #[arg(short, long = "image", value_name = "URL[::DESCRIPTION]")]
    images: Vec<String>,

    /// Maximum amount the job may cost
    #[arg(long, default_value_t = DEFAULT_APPROVAL_BUDGET)]
    approve_up_to: u64,

    /// Return right after submission instead of waiting for the video
    #[arg(long)]
    no_wait: bool,

    /// Seconds between status checks
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Give up waiting after this many seconds
    #[arg(long, value_name = "SECS")]
    max_wait: Option<u64>,

    /// Print the result record as JSON
    #[arg(long)]
    json: bool,
}

/// Handle `scrptly generate`
pub async fn handle_generate(args: GenerateArgs, config: &Config) -> Result<()> {
    let lifecycle = config.lifecycle_client()?;

    let mut spec = JobSpec::new(args.prompt).with_approval_budget(args.approve_up_to);
    for raw in &args.images {
        spec = spec.with_image(parse_image(raw)?);
    }

    let mut options = RunOptions::from_config(lifecycle.config()).with_wait(!args.no_wait);
    if let Some(secs) = args.poll_interval {
        if secs == 0 {
            bail!("--poll-interval must be greater than 0");
        }
        options = options.with_poll_interval(Duration::from_secs(secs));
    }
    if let Some(secs) = args.max_wait {
        options = options.with_max_wait(Duration::from_secs(secs));
    }

    let cancel = CancellationToken::new();
    options = options.with_cancel(cancel.clone());
    cancel_on_interrupt(tokio::signal::ctrl_c(), cancel);

    let lifecycle = if args.json {
        lifecycle
    } else {
        println!("{}", "Submitting video generation job...".bold());
        lifecycle.with_progress(Arc::new(ConsoleProgress))
    };

    let outcome = lifecycle.run_job(&spec, &options).await?;
    print_outcome(&outcome, args.json)?;

    match outcome {
        JobOutcome::TimedOut { .. } | JobOutcome::Cancelled { .. } => {
            bail!("job did not finish; check it later with `scrptly status`")
        }
        other => other.into_result().map(|_| ()).map_err(Into::into),
    }
}

/// Cancels `token` once `interrupt` fires
///
/// Polling stops at the next wait; the job keeps running remotely.
fn cancel_on_interrupt<F>(interrupt: F, token: CancellationToken) -> JoinHandle<()>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match interrupt.await {
            Ok(()) => {
                warn!("Interrupted, no longer waiting for the job");
                token.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    })
}

/// Parses `URL` or `URL::DESCRIPTION`
fn parse_image(raw: &str) -> Result<ContextImage> {
    let (url, description) = match raw.split_once("::") {
        Some((url, description)) => (url.trim(), Some(description.trim())),
        None => (raw.trim(), None),
    };

    if url.is_empty() {
        bail!("context image URL cannot be empty: {:?}", raw);
    }

    let image = ContextImage::new(url);
    Ok(match description {
        Some(description) => image.with_description(description),
        None => image,
    })
}
