//! Scrptly CLI
//!
//! Command-line interface for generating videos with Scrptly.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use scrptly_core::dto::job::ApiFlavor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scrptly")]
#[command(about = "Generate AI videos with Scrptly", long_about = None)]
struct Cli {
    /// Generation API URL
    #[arg(long, env = "SCRPTLY_API_URL")]
    api_url: Option<String>,

    /// Base URL used to build task status links
    #[arg(long, env = "SCRPTLY_STATUS_URL")]
    status_url: Option<String>,

    /// API key (sent as bearer token)
    #[arg(long, env = "SCRPTLY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request dialect: classic or events
    #[arg(long)]
    api_flavor: Option<ApiFlavor>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrptly_runner=warn,scrptly_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut lifecycle = scrptly_runner::Config::from_env()?;
    if let Some(api_url) = cli.api_url {
        lifecycle.api_url = api_url;
    }
    if let Some(status_url) = cli.status_url {
        lifecycle.status_base_url = status_url;
    }
    if let Some(flavor) = cli.api_flavor {
        lifecycle.api_flavor = flavor;
    }

    let config = Config {
        lifecycle,
        api_key: cli.api_key,
    };

    handle_command(cli.command, &config).await
}
