//! Result record handed back to the host

use serde::{Deserialize, Serialize};

use crate::domain::outcome::JobOutcome;

/// Flat record describing how a job run ended
///
/// Keys match what workflow hosts already consume from the generator
/// (`resultVideoUrl`, `resultVideoThumbnail`, ...). Runs that did not wait
/// carry the task reference and the raw `startResponse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRecord {
    pub status: String,
    pub task_id: String,
    pub status_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_video_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_response: Option<serde_json::Value>,
}

impl From<&JobOutcome> for OutcomeRecord {
    fn from(outcome: &JobOutcome) -> Self {
        let handle = outcome.handle();
        let mut record = OutcomeRecord {
            status: outcome.label().to_string(),
            task_id: handle.task_id.to_string(),
            status_url: handle.status_endpoint.clone(),
            ..Default::default()
        };

        match outcome {
            JobOutcome::Completed(job) => {
                record.status_message = job.final_message.clone();
                record.project_url = job.project_url.clone();
                record.project_id = job.project_id.clone();
                record.result_video_url = Some(job.video_url.clone());
                record.result_video_thumbnail = Some(job.thumbnail_url.clone());
            }
            JobOutcome::Failed { reason, .. } => {
                record.reason = Some(reason.clone());
            }
            JobOutcome::Submitted { start_response, .. } => {
                record.start_response = Some(start_response.clone());
            }
            JobOutcome::TimedOut { elapsed, .. } | JobOutcome::Cancelled { elapsed, .. } => {
                record.elapsed_seconds = Some(elapsed.as_secs());
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{JobHandle, TaskId};
    use crate::domain::outcome::CompletedJob;
    use serde_json::json;
    use std::time::Duration;

    fn handle() -> JobHandle {
        JobHandle::new(TaskId::new("T1"), "https://x/status/T1")
    }

    #[test]
    fn test_completed_record() {
        let outcome = JobOutcome::Completed(CompletedJob {
            handle: handle(),
            project_id: Some("p1".to_string()),
            project_url: None,
            video_url: "https://v/1.mp4".to_string(),
            thumbnail_url: "https://v/1.jpg".to_string(),
            final_message: Some("done".to_string()),
        });

        let value = serde_json::to_value(OutcomeRecord::from(&outcome)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "taskId": "T1",
                "statusUrl": "https://x/status/T1",
                "statusMessage": "done",
                "projectId": "p1",
                "resultVideoUrl": "https://v/1.mp4",
                "resultVideoThumbnail": "https://v/1.jpg"
            })
        );
    }

    #[test]
    fn test_submitted_record_keeps_start_response() {
        let outcome = JobOutcome::Submitted {
            handle: handle(),
            start_response: json!({"success": true, "taskId": "T1", "credits": 42}),
        };

        let value = serde_json::to_value(OutcomeRecord::from(&outcome)).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "submitted",
                "taskId": "T1",
                "statusUrl": "https://x/status/T1",
                "startResponse": {"success": true, "taskId": "T1", "credits": 42}
            })
        );
    }

    #[test]
    fn test_timed_out_record() {
        let outcome = JobOutcome::TimedOut {
            handle: handle(),
            elapsed: Duration::from_secs(90),
        };

        let record = OutcomeRecord::from(&outcome);
        assert_eq!(record.status, "timed_out");
        assert_eq!(record.elapsed_seconds, Some(90));
        assert_eq!(record.result_video_url, None);
    }
}
