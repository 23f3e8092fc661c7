//! Terminal rendering of progress, outcomes and snapshots

use anyhow::Result;
use colored::*;
use scrptly_core::domain::job::{JobState, JobStatusSnapshot};
use scrptly_core::domain::outcome::JobOutcome;
use scrptly_core::dto::outcome::OutcomeRecord;
use scrptly_runner::{ProgressEvent, ProgressSink};

/// Prints one line per pending snapshot
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        println!(
            "  {} [{:>4}s] {}",
            "▸".cyan(),
            event.elapsed.as_secs(),
            event
                .message
                .as_deref()
                .unwrap_or("still rendering")
                .dimmed()
        );
    }
}

/// Print how a job run ended
pub fn print_outcome(outcome: &JobOutcome, json: bool) -> Result<()> {
    if json {
        let record = OutcomeRecord::from(outcome);
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let handle = outcome.handle();
    match outcome {
        JobOutcome::Completed(job) => {
            println!("{}", "✓ Video ready".green().bold());
            println!("  Video:     {}", job.video_url.cyan());
            println!("  Thumbnail: {}", job.thumbnail_url);
            if let Some(url) = &job.project_url {
                println!("  Project:   {}", url);
            }
            if let Some(message) = &job.final_message {
                println!("  Message:   {}", message.dimmed());
            }
        }
        JobOutcome::Failed { reason, .. } => {
            println!("{}", "✗ Job failed".red().bold());
            println!("  Reason:    {}", reason.red());
        }
        JobOutcome::Submitted { .. } => {
            println!("{}", "✓ Job submitted".green().bold());
        }
        JobOutcome::TimedOut { elapsed, .. } => {
            println!(
                "{}",
                format!("⚠ Stopped waiting after {}s", elapsed.as_secs()).yellow()
            );
        }
        JobOutcome::Cancelled { elapsed, .. } => {
            println!(
                "{}",
                format!("⚠ Cancelled after {}s", elapsed.as_secs()).yellow()
            );
        }
    }

    println!("  Task:      {}", handle.task_id.to_string().dimmed());
    println!("  Status:    {}", handle.status_endpoint.dimmed());

    Ok(())
}

/// Print a single status snapshot
pub fn print_snapshot(snapshot: &JobStatusSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!("{}", "Job Status:".bold());
    println!("  State:     {}", colorize_state(snapshot.state));
    if let Some(message) = &snapshot.message {
        println!("  Message:   {}", message);
    }
    if let Some(project) = &snapshot.project {
        if let Some(url) = &project.url {
            println!("  Project:   {}", url);
        }
    }
    if let Some(output) = &snapshot.output {
        println!("  Video:     {}", output.video_url.cyan());
        println!("  Thumbnail: {}", output.thumbnail_url);
    }
    println!(
        "  Observed:  {}",
        snapshot
            .observed_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );

    Ok(())
}

/// Colorize job state for display
fn colorize_state(state: JobState) -> ColoredString {
    let state_str = format!("{:?}", state);
    match state {
        JobState::Pending => state_str.yellow(),
        JobState::Success => state_str.green(),
        JobState::Failed => state_str.red(),
    }
}
