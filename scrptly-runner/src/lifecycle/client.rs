//! Job lifecycle client
//!
//! Submits a job, polls its status endpoint and resolves it to exactly one
//! terminal outcome. Every terminal snapshot returns out of the polling loop;
//! the loop is otherwise bounded only by the caller's wait limit and
//! cancellation token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use scrptly_client::{ClientError, CredentialProvider, ReqwestTransport, ScrptlyClient};
use scrptly_core::domain::job::{JobHandle, JobSpec, JobState, JobStatusSnapshot};
use scrptly_core::domain::outcome::{CompletedJob, JobOutcome};
use scrptly_core::dto::job::{
    GenerateVideoRequest, GenerateVideoResponse, ParsedSnapshot, parse_status_body,
};
use tokio::time::{self, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{LifecycleError, Result};
use crate::lifecycle::options::RunOptions;
use crate::lifecycle::progress::{ProgressEvent, ProgressSink, TracingProgress};
use crate::lifecycle::state::{LifecyclePhase, PhaseTracker};

/// Polling state for one submitted job
///
/// Tracks how many unparseable snapshots arrived in a row so that a
/// persistently broken status endpoint fails the job instead of spinning.
#[derive(Debug)]
pub struct JobWatch {
    handle: JobHandle,
    malformed_streak: u32,
    max_malformed: u32,
}

impl JobWatch {
    pub fn new(handle: JobHandle, max_malformed: u32) -> Self {
        Self {
            handle,
            malformed_streak: 0,
            max_malformed,
        }
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    pub fn malformed_streak(&self) -> u32 {
        self.malformed_streak
    }

    pub fn into_handle(self) -> JobHandle {
        self.handle
    }

    fn record(&mut self, parsed: ParsedSnapshot) -> Result<JobStatusSnapshot> {
        match parsed {
            ParsedSnapshot::WellFormed(snapshot) => {
                self.malformed_streak = 0;
                Ok(snapshot)
            }
            ParsedSnapshot::Malformed { snapshot, reason } => {
                self.malformed_streak += 1;
                if self.malformed_streak > self.max_malformed {
                    return Err(LifecycleError::Poll(format!(
                        "{} consecutive unparseable status snapshots for task {} (last: {})",
                        self.malformed_streak, self.handle.task_id, reason
                    )));
                }

                warn!(
                    task_id = %self.handle.task_id,
                    streak = self.malformed_streak,
                    "Treating unparseable status snapshot as pending: {}",
                    reason
                );
                Ok(snapshot)
            }
        }
    }
}

/// Why the wait before a poll ended
enum Wake {
    Poll,
    TimedOut,
    Cancelled,
}

/// Resolves video generation jobs to terminal outcomes
///
/// Holds no per-job state; a single instance can drive any number of jobs
/// concurrently.
#[derive(Clone)]
pub struct JobLifecycleClient {
    client: ScrptlyClient,
    config: Config,
    progress: Arc<dyn ProgressSink>,
}

impl fmt::Debug for JobLifecycleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobLifecycleClient")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JobLifecycleClient {
    /// Creates a lifecycle client that reports progress through `tracing`
    pub fn new(client: ScrptlyClient, config: Config) -> Self {
        Self {
            client,
            config,
            progress: Arc::new(TracingProgress),
        }
    }

    /// Builds the gateway from configuration using the `reqwest` transport
    pub fn from_config(
        config: Config,
        credentials: impl CredentialProvider + 'static,
    ) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.request_timeout)?;
        let client = ScrptlyClient::with_transport(
            config.api_url.clone(),
            Arc::new(transport),
            Arc::new(credentials),
        );
        Ok(Self::new(client, config))
    }

    /// Replaces the progress sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying authenticated gateway
    pub fn gateway(&self) -> &ScrptlyClient {
        &self.client
    }

    /// Starts polling state for a handle, e.g. one obtained earlier from
    /// [`JobLifecycleClient::submit_job`]
    pub fn watch(&self, handle: JobHandle) -> JobWatch {
        JobWatch::new(handle, self.config.max_malformed_snapshots)
    }

    /// Submits a job; never retried
    ///
    /// # Errors
    /// * [`LifecycleError::InvalidSpec`] - rejected locally, nothing was sent
    /// * [`LifecycleError::Submission`] - the service did not accept the job
    /// * [`LifecycleError::Auth`] / [`LifecycleError::Transport`] - gateway failures
    pub async fn submit_job(&self, spec: &JobSpec) -> Result<JobHandle> {
        self.submit(spec).await.map(|(handle, _)| handle)
    }

    /// Submits a job, keeping the raw response body next to the handle
    async fn submit(&self, spec: &JobSpec) -> Result<(JobHandle, serde_json::Value)> {
        spec.validate(self.config.max_context_images)?;

        let request = GenerateVideoRequest::from_spec(spec, self.config.api_flavor);
        let response = match self.client.submit_generation(&request).await {
            Ok(response) => response,
            Err(ClientError::Remote { status, body }) => {
                return Err(rejection_from_body(status, &body));
            }
            Err(e) => return Err(e.into()),
        };

        let start_response: serde_json::Value =
            serde_json::from_str(&response.body).map_err(|e| LifecycleError::Submission {
                reason: format!("unreadable submission response: {}", e),
            })?;
        let accepted: GenerateVideoResponse = serde_json::from_value(start_response.clone())
            .map_err(|e| LifecycleError::Submission {
                reason: format!("unexpected submission response: {}", e),
            })?;

        let handle = accepted
            .into_handle(&self.config.status_base_url)
            .map_err(|rejected| LifecycleError::Submission {
                reason: rejected.reason,
            })?;

        info!(
            task_id = %handle.task_id,
            status_endpoint = %handle.status_endpoint,
            "Job submitted"
        );

        Ok((handle, start_response))
    }

    /// Issues one status request and maps the answer onto a snapshot
    ///
    /// Unparseable answers count as pending until more than
    /// `max_malformed_snapshots` arrive in a row.
    pub async fn poll_once(&self, watch: &mut JobWatch) -> Result<JobStatusSnapshot> {
        let response = self
            .client
            .fetch_status(&watch.handle.status_endpoint)
            .await?;

        watch.record(parse_status_body(&response.body, chrono::Utc::now()))
    }

    /// Submits a job and, if asked to, waits for its terminal outcome
    ///
    /// Returns `Submitted` straight after submission when `options.wait` is
    /// false. Otherwise polls every `options.poll_interval` until the job
    /// completes or fails, `options.max_wait` elapses since submission
    /// (`TimedOut`), or `options.cancel` fires (`Cancelled`).
    pub async fn run_job(&self, spec: &JobSpec, options: &RunOptions) -> Result<JobOutcome> {
        let mut tracker = PhaseTracker::new();
        tracker.advance(LifecyclePhase::Submitting, None);

        let (handle, start_response) = match self.submit(spec).await {
            Ok(submitted) => submitted,
            Err(e) => {
                tracker.advance(LifecyclePhase::SubmitFailed, None);
                warn!("Job submission failed: {}", e);
                return Err(e);
            }
        };
        let submitted_at = Instant::now();
        tracker.advance(LifecyclePhase::Submitted, Some(&handle.task_id));

        if !options.wait {
            info!(task_id = %handle.task_id, "Not waiting for completion");
            return Ok(JobOutcome::Submitted {
                handle,
                start_response,
            });
        }

        let task_id = handle.task_id.clone();
        tracker.advance(LifecyclePhase::Polling, Some(&task_id));

        let result = self
            .poll_until_terminal(self.watch(handle), submitted_at, options)
            .await;

        let phase = match &result {
            Ok(JobOutcome::Completed(_)) => LifecyclePhase::Completed,
            Ok(JobOutcome::TimedOut { .. }) => LifecyclePhase::TimedOut,
            Ok(JobOutcome::Cancelled { .. }) => LifecyclePhase::Cancelled,
            Ok(_) | Err(_) => LifecyclePhase::Failed,
        };
        tracker.advance(phase, Some(&task_id));

        info!(
            %task_id,
            phase = ?tracker.phase(),
            elapsed_secs = submitted_at.elapsed().as_secs(),
            "Job run finished"
        );

        result
    }

    async fn poll_until_terminal(
        &self,
        mut watch: JobWatch,
        submitted_at: Instant,
        options: &RunOptions,
    ) -> Result<JobOutcome> {
        let mut poll_count: u32 = 0;
        let mut transient_failures: u32 = 0;
        let mut delay = options.poll_interval;

        loop {
            match wait_for_next_poll(delay, submitted_at, options).await {
                Wake::Poll => {}
                Wake::TimedOut => {
                    let elapsed = submitted_at.elapsed();
                    warn!(
                        task_id = %watch.handle.task_id,
                        elapsed_secs = elapsed.as_secs(),
                        "Gave up waiting for job"
                    );
                    return Ok(JobOutcome::TimedOut {
                        handle: watch.into_handle(),
                        elapsed,
                    });
                }
                Wake::Cancelled => {
                    let elapsed = submitted_at.elapsed();
                    info!(task_id = %watch.handle.task_id, "Job polling cancelled");
                    return Ok(JobOutcome::Cancelled {
                        handle: watch.into_handle(),
                        elapsed,
                    });
                }
            }

            poll_count += 1;
            let snapshot = match self.poll_once(&mut watch).await {
                Ok(snapshot) => {
                    transient_failures = 0;
                    delay = options.poll_interval;
                    snapshot
                }
                Err(e) if e.is_transient() && transient_failures < options.retry.max_attempts => {
                    transient_failures += 1;
                    delay = options.retry.delay_for(transient_failures);
                    warn!(
                        task_id = %watch.handle.task_id,
                        attempt = transient_failures,
                        max_attempts = options.retry.max_attempts,
                        "Status poll failed, retrying in {:?}: {}",
                        delay,
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            match snapshot.state {
                JobState::Failed => {
                    let reason = snapshot
                        .message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| "unknown error".to_string());
                    warn!(task_id = %watch.handle.task_id, "Job failed: {}", reason);
                    return Ok(JobOutcome::Failed {
                        handle: watch.into_handle(),
                        reason,
                    });
                }
                JobState::Success => {
                    let job = completed(watch.into_handle(), snapshot)?;
                    info!(
                        task_id = %job.handle.task_id,
                        video_url = %job.video_url,
                        "Job completed"
                    );
                    return Ok(JobOutcome::Completed(job));
                }
                JobState::Pending => {
                    self.progress.on_progress(&ProgressEvent {
                        task_id: watch.handle.task_id.clone(),
                        message: snapshot.message,
                        elapsed: submitted_at.elapsed(),
                        poll_count,
                    });
                }
            }
        }
    }
}

/// Suspends until the next poll is due
///
/// This is the only place cancellation is observed. If the next poll would
/// start after `max_wait`, sleeps until the deadline instead and reports a
/// timeout.
async fn wait_for_next_poll(delay: Duration, submitted_at: Instant, options: &RunOptions) -> Wake {
    let (sleep_for, wake) = match options.max_wait {
        Some(max_wait) => {
            let remaining = max_wait.saturating_sub(submitted_at.elapsed());
            if remaining < delay {
                (remaining, Wake::TimedOut)
            } else {
                (delay, Wake::Poll)
            }
        }
        None => (delay, Wake::Poll),
    };

    match &options.cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Wake::Cancelled,
                _ = time::sleep(sleep_for) => wake,
            }
        }
        None => {
            time::sleep(sleep_for).await;
            wake
        }
    }
}

/// Success needs render output; the state alone is not enough
fn completed(handle: JobHandle, snapshot: JobStatusSnapshot) -> Result<CompletedJob> {
    let Some(output) = snapshot.output else {
        return Err(LifecycleError::Poll(format!(
            "task {} reported success without render output",
            handle.task_id
        )));
    };

    let (project_id, project_url) = snapshot
        .project
        .map(|project| (project.id, project.url))
        .unwrap_or_default();

    Ok(CompletedJob {
        handle,
        project_id,
        project_url,
        video_url: output.video_url,
        thumbnail_url: output.thumbnail_url,
        final_message: snapshot.message,
    })
}

fn rejection_from_body(status: u16, body: &str) -> LifecycleError {
    let reason = GenerateVideoResponse::parse(body)
        .ok()
        .and_then(|response| response.error_text().map(str::to_string))
        .unwrap_or_else(|| {
            let excerpt: String = body.chars().take(200).collect();
            format!("service answered {}: {}", status, excerpt)
        });

    LifecycleError::Submission { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::options::RetryPolicy;
    use crate::lifecycle::progress::NoopProgress;
    use scrptly_client::{ScriptedTransport, StaticToken};
    use scrptly_core::domain::job::ContextImage;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// Records progress and optionally cancels after a number of events
    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<ProgressEvent>>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl RecordingProgress {
        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, event: &ProgressEvent) {
            let mut events = self.events.lock().unwrap();
            events.push(event.clone());
            if let Some((after, token)) = &self.cancel_after {
                if events.len() >= *after {
                    token.cancel();
                }
            }
        }
    }

    fn lifecycle(transport: &Arc<ScriptedTransport>) -> JobLifecycleClient {
        let client = ScrptlyClient::with_transport(
            "https://api.scrptly.com",
            transport.clone(),
            Arc::new(StaticToken::new("secret")),
        );
        JobLifecycleClient::new(client, Config::default()).with_progress(Arc::new(NoopProgress))
    }

    fn cat_spec() -> JobSpec {
        JobSpec::new("a cat").with_approval_budget(5000)
    }

    fn accepted(transport: &ScriptedTransport) {
        transport.push_json(200, json!({"taskId": "T1", "statusUrl": "https://x/status/T1"}));
    }

    fn pending(transport: &ScriptedTransport) {
        transport.push_json(200, json!({"status": "pending", "message": "rendering"}));
    }

    fn success(transport: &ScriptedTransport) {
        transport.push_json(
            200,
            json!({
                "status": "success",
                "message": "done",
                "projectId": "p1",
                "projectUrl": "https://scrptly.com/p/p1",
                "renderInfo": {"output": {"video": "https://v/1.mp4", "thumbnail": "https://v/1.jpg"}}
            }),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_success_completes() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        pending(&transport);
        pending(&transport);
        success(&transport);

        let progress = Arc::new(RecordingProgress::default());
        let lifecycle = lifecycle(&transport).with_progress(progress.clone());

        let outcome = lifecycle
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();

        match outcome {
            JobOutcome::Completed(job) => {
                assert_eq!(job.video_url, "https://v/1.mp4");
                assert_eq!(job.thumbnail_url, "https://v/1.jpg");
                assert_eq!(job.project_id.as_deref(), Some("p1"));
                assert_eq!(job.final_message.as_deref(), Some("done"));
                assert_eq!(job.handle.task_id.as_str(), "T1");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].url, "https://api.scrptly.com/generateAiVideo");
        assert_eq!(
            requests[0].body,
            Some(json!({"prompt": "a cat", "contextImages": [], "approveUpTo": 5000}))
        );
        for request in &requests {
            assert_eq!(request.header_value("Authorization"), Some("Bearer secret"));
        }
        for request in &requests[1..] {
            assert_eq!(request.url, "https://x/status/T1");
        }

        let events = progress.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].poll_count, 1);
        assert_eq!(events[1].poll_count, 2);
        assert_eq!(events[0].message.as_deref(), Some("rendering"));
        assert!(events[1].elapsed >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_returns_submitted_after_one_call() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        pending(&transport);

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default().no_wait())
            .await
            .unwrap();

        match outcome {
            JobOutcome::Submitted {
                handle,
                start_response,
            } => {
                assert_eq!(handle.task_id.as_str(), "T1");
                assert_eq!(handle.status_endpoint, "https://x/status/T1");
                assert_eq!(start_response["taskId"], "T1");
                assert_eq!(start_response["statusUrl"], "https://x/status/T1");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_submission_is_not_polled() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"success": false, "error": "budget too low"}));
        pending(&transport);

        let err = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap_err();

        match err {
            LifecycleError::Submission { reason } => assert_eq!(reason, "budget too low"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_with_error_status_keeps_server_reason() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(402, json!({"success": false, "error": "insufficient credits"}));

        let err = lifecycle(&transport).submit_job(&cat_spec()).await.unwrap_err();
        match err {
            LifecycleError::Submission { reason } => assert_eq!(reason, "insufficient credits"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ok_status_without_task_id_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"queued": true}));

        let err = lifecycle(&transport).submit_job(&cat_spec()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Submission { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_spec_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut spec = cat_spec();
        for i in 0..11 {
            spec = spec.with_image(ContextImage::new(format!("https://img/{}.png", i)));
        }

        let err = lifecycle(&transport).submit_job(&spec).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidSpec(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_derived_status_endpoint_is_polled() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"taskId": "job/42"}));
        success(&transport);

        lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[1].url,
            "https://scrptly.com/task-status/job%2F42"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_snapshot_stops_polling() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        pending(&transport);
        transport.push_json(200, json!({"status": "failed", "message": "render crashed"}));
        pending(&transport);
        success(&transport);

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();

        match outcome {
            JobOutcome::Failed { reason, .. } => assert_eq!(reason, "render crashed"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.remaining(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_snapshot_without_message() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        transport.push_json(200, json!({"status": "failed"}));

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Failed {
                handle: JobHandle::new(
                    scrptly_core::domain::job::TaskId::new("T1"),
                    "https://x/status/T1"
                ),
                reason: "unknown error".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_without_output_is_a_poll_error() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        transport.push_json(200, json!({"status": "success", "message": "done"}));
        success(&transport);

        let err = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Poll(_)));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_wait_times_out_without_further_polls() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        for _ in 0..10 {
            pending(&transport);
        }

        let options = RunOptions::default().with_max_wait(Duration::from_secs(50));
        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &options)
            .await
            .unwrap();

        match outcome {
            JobOutcome::TimedOut { elapsed, .. } => {
                assert!(elapsed >= Duration::from_secs(50));
                assert!(elapsed < Duration::from_secs(60));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // polls at 15s, 30s and 45s; the next one would start past the limit
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_snapshots_up_to_threshold_are_pending() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        transport.push_body(200, "<html>oops</html>");
        transport.push_json(200, json!({}));
        transport.push_json(200, json!({"status": "exploded"}));
        success(&transport);

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_snapshots_past_threshold_fail() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        for _ in 0..4 {
            transport.push_body(200, "not json");
        }
        success(&transport);

        let err = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Poll(_)));
        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_well_formed_snapshot_resets_malformed_streak() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        for _ in 0..3 {
            transport.push_body(200, "not json");
        }
        pending(&transport);
        for _ in 0..3 {
            transport.push_body(200, "not json");
        }
        success(&transport);

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();
        assert!(matches!(outcome, JobOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_tracks_streak() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_body(200, "not json");
        pending(&transport);

        let lifecycle = lifecycle(&transport);
        let mut watch = lifecycle.watch(JobHandle::new(
            scrptly_core::domain::job::TaskId::new("T1"),
            "https://x/status/T1",
        ));

        let snapshot = lifecycle.poll_once(&mut watch).await.unwrap();
        assert_eq!(snapshot.state, JobState::Pending);
        assert_eq!(watch.malformed_streak(), 1);

        lifecycle.poll_once(&mut watch).await.unwrap();
        assert_eq!(watch.malformed_streak(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_observed_between_polls() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        for _ in 0..5 {
            pending(&transport);
        }

        let token = CancellationToken::new();
        let progress = Arc::new(RecordingProgress {
            events: Mutex::new(Vec::new()),
            cancel_after: Some((2, token.clone())),
        });
        let options = RunOptions::default().with_cancel(token);

        let outcome = lifecycle(&transport)
            .with_progress(progress)
            .run_job(&cat_spec(), &options)
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Cancelled { .. }));
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_poll() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        pending(&transport);

        let token = CancellationToken::new();
        token.cancel();

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default().with_cancel(token))
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Cancelled { .. }));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_poll_errors_are_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        transport.push_error(ClientError::Transport("connection reset".to_string()));
        transport.push_body(503, "busy");
        success(&transport);

        let outcome = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap();

        assert!(matches!(outcome, JobOutcome::Completed(_)));
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_poll_errors_exhaust_retries() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        for _ in 0..3 {
            transport.push_error(ClientError::Transport("connection reset".to_string()));
        }
        success(&transport);

        let options = RunOptions::default().with_retry(RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        });
        let err = lifecycle(&transport)
            .run_job(&cat_spec(), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Transport(_)));
        assert_eq!(transport.request_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_while_polling_is_fatal() {
        let transport = Arc::new(ScriptedTransport::new());
        accepted(&transport);
        transport.push_body(401, "unauthorized");
        success(&transport);

        let err = lifecycle(&transport)
            .run_job(&cat_spec(), &RunOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::Auth(_)));
        assert_eq!(transport.request_count(), 2);
    }
}
