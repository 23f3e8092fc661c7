//! Scrptly Runner
//!
//! Resolves asynchronous video generation jobs to terminal outcomes.
//!
//! Architecture:
//! - Configuration: endpoints, poll interval and wait bounds from environment or defaults
//! - Lifecycle: submission, status polling, timeout and cancellation handling
//!
//! Each job is driven independently: the client keeps no state shared between
//! jobs, so callers may run as many jobs concurrently as they like.
//!
//! # Example
//!
//! ```no_run
//! use scrptly_client::EnvToken;
//! use scrptly_core::domain::job::JobSpec;
//! use scrptly_runner::{Config, JobLifecycleClient, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let options = RunOptions::from_config(&config);
//!     let lifecycle = JobLifecycleClient::from_config(config, EnvToken::new("SCRPTLY_API_KEY"))?;
//!
//!     let outcome = lifecycle.run_job(&JobSpec::new("a cat on a skateboard"), &options).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;

pub use config::Config;
pub use error::{LifecycleError, Result};
pub use lifecycle::{
    JobLifecycleClient, JobWatch, LifecyclePhase, NoopProgress, OutcomeExt, ProgressEvent,
    ProgressSink, RetryPolicy, RunOptions, TracingProgress,
};
