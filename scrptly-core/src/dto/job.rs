//! Job DTOs for the generation and status endpoints

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::job::{
    ContextImage, JobHandle, JobSpec, JobState, JobStatusSnapshot, ProjectRef, RenderOutput,
    TaskId,
};

/// Wire dialect of the generation API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// Images sent as `contextImages`; status URL usually derived locally
    #[default]
    Classic,
    /// Images sent as `context`; status URL usually returned as `eventsUrl`
    Events,
}

impl FromStr for ApiFlavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "events" => Ok(Self::Events),
            other => Err(format!("unknown API flavor: {}", other)),
        }
    }
}

/// Context images under the field name a given flavor expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContextField {
    #[serde(rename = "contextImages")]
    ContextImages(Vec<ContextImage>),
    #[serde(rename = "context")]
    Context(Vec<ContextImage>),
}

/// Body of `POST /generateAiVideo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    pub prompt: String,
    #[serde(flatten)]
    pub images: ContextField,
    pub approve_up_to: u64,
}

impl GenerateVideoRequest {
    pub fn from_spec(spec: &JobSpec, flavor: ApiFlavor) -> Self {
        let images = spec.context_images.clone();
        Self {
            prompt: spec.prompt.clone(),
            images: match flavor {
                ApiFlavor::Classic => ContextField::ContextImages(images),
                ApiFlavor::Events => ContextField::Context(images),
            },
            approve_up_to: spec.approval_budget,
        }
    }
}

/// Reason the service did not accept a job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct SubmissionRejected {
    pub reason: String,
}

/// Response of `POST /generateAiVideo`, in any of its known shapes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, deserialize_with = "opaque_text")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default)]
    pub events_url: Option<String>,
    #[serde(default, deserialize_with = "opaque_text")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "opaque_text")]
    pub message: Option<String>,
}

impl GenerateVideoResponse {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Server-supplied explanation, if any
    pub fn error_text(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|text| !text.trim().is_empty())
    }

    /// Turns an accepted response into a [`JobHandle`]
    ///
    /// A response counts as accepted only when it carries a task id and does
    /// not explicitly say `success: false`. The HTTP status is not consulted.
    pub fn into_handle(self, status_base_url: &str) -> Result<JobHandle, SubmissionRejected> {
        if self.success == Some(false) {
            return Err(SubmissionRejected {
                reason: self
                    .error_text()
                    .unwrap_or("service rejected the job")
                    .to_string(),
            });
        }

        let task_id = match self.task_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => TaskId::new(id),
            _ => {
                return Err(SubmissionRejected {
                    reason: self
                        .error_text()
                        .unwrap_or("missing taskId in submission response")
                        .to_string(),
                });
            }
        };

        let endpoint = self
            .status_url
            .or(self.events_url)
            .filter(|url| !url.trim().is_empty());

        Ok(match endpoint {
            Some(url) => JobHandle::new(task_id, url),
            None => JobHandle::derived(task_id, status_base_url),
        })
    }
}

/// Response of `GET <status endpoint>`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "opaque_text")]
    pub message: Option<String>,
    #[serde(default)]
    pub project_url: Option<String>,
    #[serde(default, deserialize_with = "opaque_text")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub render_info: Option<RenderInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderInfo {
    #[serde(default)]
    pub output: Option<RenderOutputPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderOutputPayload {
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// A status body mapped onto a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSnapshot {
    WellFormed(JobStatusSnapshot),
    /// Body could not be understood; the snapshot is a pending placeholder
    Malformed {
        snapshot: JobStatusSnapshot,
        reason: String,
    },
}

/// Parses a raw status body
///
/// Bodies that are not JSON objects, or lack a recognizable `status`, become
/// pending placeholders flagged as malformed.
pub fn parse_status_body(
    body: &str,
    observed_at: chrono::DateTime<chrono::Utc>,
) -> ParsedSnapshot {
    let response: TaskStatusResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            return ParsedSnapshot::Malformed {
                snapshot: JobStatusSnapshot::pending(None, observed_at),
                reason: format!("unparseable status body: {}", e),
            };
        }
    };

    let state = match response.status.as_deref() {
        Some(raw) => match JobState::parse(raw) {
            Some(state) => state,
            None => {
                return ParsedSnapshot::Malformed {
                    snapshot: JobStatusSnapshot::pending(response.message, observed_at),
                    reason: format!("unrecognized status: {}", raw),
                };
            }
        },
        None => {
            return ParsedSnapshot::Malformed {
                snapshot: JobStatusSnapshot::pending(response.message, observed_at),
                reason: "status field missing".to_string(),
            };
        }
    };

    let project = match (&response.project_id, &response.project_url) {
        (None, None) => None,
        (id, url) => Some(ProjectRef {
            id: id.clone(),
            url: url.clone(),
        }),
    };

    let output = response
        .render_info
        .and_then(|info| info.output)
        .and_then(|output| match (output.video, output.thumbnail) {
            (Some(video), Some(thumbnail))
                if !video.trim().is_empty() && !thumbnail.trim().is_empty() =>
            {
                Some(RenderOutput {
                    video_url: video,
                    thumbnail_url: thumbnail,
                })
            }
            _ => None,
        });

    ParsedSnapshot::WellFormed(JobStatusSnapshot {
        state,
        message: response.message,
        project,
        output,
        observed_at,
    })
}

/// Accepts strings, numbers and other scalars as opaque text
fn opaque_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }

    #[test]
    fn test_request_field_name_follows_flavor() {
        let spec = JobSpec::new("a cat")
            .with_image(ContextImage::new("https://img/1.png").with_description("cat"))
            .with_approval_budget(5000);

        let classic = serde_json::to_value(GenerateVideoRequest::from_spec(
            &spec,
            ApiFlavor::Classic,
        ))
        .unwrap();
        assert_eq!(
            classic,
            json!({
                "prompt": "a cat",
                "contextImages": [{"url": "https://img/1.png", "description": "cat"}],
                "approveUpTo": 5000
            })
        );

        let events =
            serde_json::to_value(GenerateVideoRequest::from_spec(&spec, ApiFlavor::Events))
                .unwrap();
        assert!(events.get("contextImages").is_none());
        assert_eq!(events["context"][0]["url"], "https://img/1.png");
    }

    #[test]
    fn test_api_flavor_from_str() {
        assert_eq!("Events".parse::<ApiFlavor>(), Ok(ApiFlavor::Events));
        assert_eq!("classic".parse::<ApiFlavor>(), Ok(ApiFlavor::Classic));
        assert!("v3".parse::<ApiFlavor>().is_err());
    }

    #[test]
    fn test_accepted_response_with_status_url() {
        let response =
            GenerateVideoResponse::parse(r#"{"taskId":"T1","statusUrl":"https://x/status/T1"}"#)
                .unwrap();
        let handle = response.into_handle("https://scrptly.com").unwrap();
        assert_eq!(handle.task_id.as_str(), "T1");
        assert_eq!(handle.status_endpoint, "https://x/status/T1");
    }

    #[test]
    fn test_accepted_response_with_events_url() {
        let response = GenerateVideoResponse::parse(
            r#"{"success":true,"taskId":42,"eventsUrl":"https://x/events/42"}"#,
        )
        .unwrap();
        let handle = response.into_handle("https://scrptly.com").unwrap();
        assert_eq!(handle.task_id.as_str(), "42");
        assert_eq!(handle.status_endpoint, "https://x/events/42");
    }

    #[test]
    fn test_accepted_response_derives_endpoint() {
        let response = GenerateVideoResponse::parse(r#"{"taskId":"a b"}"#).unwrap();
        let handle = response.into_handle("https://scrptly.com").unwrap();
        assert_eq!(handle.status_endpoint, "https://scrptly.com/task-status/a%20b");
    }

    #[test]
    fn test_rejected_responses() {
        let response =
            GenerateVideoResponse::parse(r#"{"success":false,"error":"budget too low"}"#).unwrap();
        assert_eq!(
            response.into_handle("https://scrptly.com").unwrap_err().reason,
            "budget too low"
        );

        // success flag alone is not enough without a task id
        let response = GenerateVideoResponse::parse(r#"{"success":true}"#).unwrap();
        assert_eq!(
            response.into_handle("https://scrptly.com").unwrap_err().reason,
            "missing taskId in submission response"
        );

        let response = GenerateVideoResponse::parse(r#"{"success":false,"taskId":"T1"}"#).unwrap();
        assert_eq!(
            response.into_handle("https://scrptly.com").unwrap_err().reason,
            "service rejected the job"
        );
    }

    #[test]
    fn test_parse_success_snapshot() {
        let body = json!({
            "status": "success",
            "message": "done",
            "projectId": 7,
            "projectUrl": "https://scrptly.com/p/7",
            "renderInfo": {"output": {"video": "https://v/1.mp4", "thumbnail": "https://v/1.jpg"}}
        })
        .to_string();

        let ParsedSnapshot::WellFormed(snapshot) = parse_status_body(&body, now()) else {
            panic!("expected a well-formed snapshot");
        };
        assert_eq!(snapshot.state, JobState::Success);
        assert_eq!(
            snapshot.output,
            Some(RenderOutput {
                video_url: "https://v/1.mp4".to_string(),
                thumbnail_url: "https://v/1.jpg".to_string(),
            })
        );
        let project = snapshot.project.as_ref().unwrap();
        assert_eq!(project.id.as_deref(), Some("7"));
        assert_eq!(project.url.as_deref(), Some("https://scrptly.com/p/7"));
    }

    #[test]
    fn test_partial_output_is_dropped() {
        let body = json!({
            "status": "success",
            "renderInfo": {"output": {"video": "https://v/1.mp4"}}
        })
        .to_string();

        let ParsedSnapshot::WellFormed(snapshot) = parse_status_body(&body, now()) else {
            panic!("expected a well-formed snapshot");
        };
        assert_eq!(snapshot.state, JobState::Success);
        assert_eq!(snapshot.output, None);
    }

    #[test]
    fn test_malformed_bodies_become_pending() {
        for body in ["<html>502</html>", "{}", r#"{"status":"exploded"}"#, "[1,2]"] {
            match parse_status_body(body, now()) {
                ParsedSnapshot::Malformed { snapshot, .. } => {
                    assert_eq!(snapshot.state, JobState::Pending)
                }
                other => panic!("expected malformed for {}: {:?}", body, other),
            }
        }
    }
}
