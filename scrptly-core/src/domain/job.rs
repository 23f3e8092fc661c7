//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Approval budget used when the caller does not specify one
pub const DEFAULT_APPROVAL_BUDGET: u64 = 10_000;

/// Reference image passed to the generator alongside the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ContextImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }
}

/// A video generation request
///
/// Built by the caller once per input record and only ever borrowed by the
/// lifecycle client, so it cannot change after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub prompt: String,
    pub context_images: Vec<ContextImage>,
    /// Maximum amount the service may charge for this job
    pub approval_budget: u64,
}

impl JobSpec {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context_images: Vec::new(),
            approval_budget: DEFAULT_APPROVAL_BUDGET,
        }
    }

    pub fn with_image(mut self, image: ContextImage) -> Self {
        self.context_images.push(image);
        self
    }

    pub fn with_approval_budget(mut self, budget: u64) -> Self {
        self.approval_budget = budget;
        self
    }

    /// Checks the spec before it is sent anywhere
    ///
    /// The approval budget is deliberately not checked: whether it covers the
    /// job is decided by the service.
    pub fn validate(&self, max_context_images: usize) -> Result<(), SpecError> {
        if self.prompt.trim().is_empty() {
            return Err(SpecError::EmptyPrompt);
        }

        if self.context_images.len() > max_context_images {
            return Err(SpecError::TooManyImages {
                count: self.context_images.len(),
                max: max_context_images,
            });
        }

        if let Some(index) = self
            .context_images
            .iter()
            .position(|image| image.url.trim().is_empty())
        {
            return Err(SpecError::EmptyImageUrl { index });
        }

        Ok(())
    }
}

/// Reasons a [`JobSpec`] is rejected locally
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("prompt cannot be empty")]
    EmptyPrompt,

    #[error("too many context images: {count} (maximum {max})")]
    TooManyImages { count: usize, max: usize },

    #[error("context image {index} has an empty URL")]
    EmptyImageUrl { index: usize },
}

/// Opaque task identifier assigned by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a submitted job
///
/// Produced once per successful submission and owned by whoever drives that
/// job from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub task_id: TaskId,
    pub status_endpoint: String,
}

impl JobHandle {
    pub fn new(task_id: TaskId, status_endpoint: impl Into<String>) -> Self {
        Self {
            task_id,
            status_endpoint: status_endpoint.into(),
        }
    }

    /// Builds a handle whose status endpoint is derived from the task id
    pub fn derived(task_id: TaskId, status_base_url: &str) -> Self {
        let status_endpoint = derive_status_endpoint(status_base_url, &task_id);
        Self {
            task_id,
            status_endpoint,
        }
    }
}

/// `<base>/task-status/<percent-encoded task id>`
///
/// Besides alphanumerics and `-_.~`, the marks `!'()*` stay literal, matching
/// how web clients of the service build the same URL.
pub fn derive_status_endpoint(status_base_url: &str, task_id: &TaskId) -> String {
    format!(
        "{}/task-status/{}",
        status_base_url.trim_end_matches('/'),
        encode_path_segment(task_id.as_str())
    )
}

fn encode_path_segment(raw: &str) -> String {
    const MARKS: [(&str, &str); 5] = [
        ("%21", "!"),
        ("%27", "'"),
        ("%28", "("),
        ("%29", ")"),
        ("%2A", "*"),
    ];

    // A literal '%' is emitted as "%25", so these escapes only come from marks
    MARKS
        .iter()
        .fold(urlencoding::encode(raw).into_owned(), |encoded, (escape, mark)| {
            encoded.replace(escape, mark)
        })
}

/// Job state as reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Success,
    Failed,
}

impl JobState {
    /// Parses a wire status string
    ///
    /// The service has reported in-progress work under several names; they
    /// all mean `Pending`. Anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" | "succeeded" | "completed" | "done" => Some(Self::Success),
            "failed" | "failure" | "error" => Some(Self::Failed),
            "pending" | "queued" | "processing" | "running" | "rendering" | "in_progress" => {
                Some(Self::Pending)
            }
            _ => None,
        }
    }
}

/// Project the service created for the job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: Option<String>,
    pub url: Option<String>,
}

/// Rendered artefacts of a finished job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub video_url: String,
    pub thumbnail_url: String,
}

/// Result of one poll of the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusSnapshot {
    pub state: JobState,
    pub message: Option<String>,
    pub project: Option<ProjectRef>,
    /// Present only when both the video and the thumbnail were reported
    pub output: Option<RenderOutput>,
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

impl JobStatusSnapshot {
    /// Snapshot standing in for a payload that could not be understood
    pub fn pending(message: Option<String>, observed_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            state: JobState::Pending,
            message,
            project: None,
            output: None,
            observed_at,
        }
    }
}
