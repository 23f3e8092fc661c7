//! Status command handler
//!
//! Polls a previously submitted job exactly once.

use anyhow::{Context, Result};
use scrptly_core::domain::job::{JobHandle, TaskId};

use crate::config::Config;
use crate::output::print_snapshot;

/// Handle `scrptly status`
pub async fn handle_status(task: &str, json: bool, config: &Config) -> Result<()> {
    let lifecycle = config.lifecycle_client()?;
    let handle = resolve_handle(task, &lifecycle.config().status_base_url);

    let mut watch = lifecycle.watch(handle);
    let snapshot = lifecycle
        .poll_once(&mut watch)
        .await
        .with_context(|| format!("Failed to fetch status of {}", task))?;

    if watch.malformed_streak() > 0 && !json {
        eprintln!("warning: the status endpoint returned an unreadable payload");
    }

    print_snapshot(&snapshot, json)
}

/// Accepts either a bare task id or a full status URL
fn resolve_handle(task: &str, status_base_url: &str) -> JobHandle {
    let task = task.trim();
    if task.starts_with("http://") || task.starts_with("https://") {
        let task_id = task
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(task);
        JobHandle::new(TaskId::new(task_id), task)
    } else {
        JobHandle::derived(TaskId::new(task), status_base_url)
    }
}
