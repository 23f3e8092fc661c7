//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod check;
mod generate;
mod status;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a video from a prompt
    Generate(generate::GenerateArgs),
    /// Show the current status of a submitted job
    Status {
        /// Task ID or full status URL
        task: String,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify that the API key is accepted
    Check,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Generate(args) => generate::handle_generate(args, config).await,
        Commands::Status { task, json } => status::handle_status(&task, json, config).await,
        Commands::Check => check::handle_check(config).await,
    }
}
