//! Generation API endpoints

use reqwest::Method;
use scrptly_core::dto::job::GenerateVideoRequest;
use serde::Deserialize;

use crate::ScrptlyClient;
use crate::error::{ClientError, Result};
use crate::transport::HttpResponse;

/// Relevant part of the `/info` response
#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    success: Option<bool>,
}

impl ScrptlyClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Ask the service to start generating a video
    ///
    /// Returns the raw response: whether the job was accepted is decided by
    /// the payload, not by the HTTP status, and is left to the caller.
    ///
    /// # Example
    /// ```no_run
    /// # use scrptly_client::{ScrptlyClient, StaticToken};
    /// # use scrptly_core::domain::job::JobSpec;
    /// # use scrptly_core::dto::job::{ApiFlavor, GenerateVideoRequest};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ScrptlyClient::new("https://api.scrptly.com", StaticToken::new("key"));
    /// let request = GenerateVideoRequest::from_spec(&JobSpec::new("a cat"), ApiFlavor::Classic);
    /// let response = client.submit_generation(&request).await?;
    /// println!("{}", response.body);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_generation(&self, request: &GenerateVideoRequest) -> Result<HttpResponse> {
        let url = format!("{}/generateAiVideo", self.base_url);
        let body = serde_json::to_value(request)
            .map_err(|e| ClientError::InvalidRequest(format!("Failed to encode job: {}", e)))?;

        self.send(Method::POST, &url, Some(body)).await
    }

    /// Fetch the current status of a job
    ///
    /// # Arguments
    /// * `status_endpoint` - Absolute URL taken from the job handle
    pub async fn fetch_status(&self, status_endpoint: &str) -> Result<HttpResponse> {
        self.send(Method::GET, status_endpoint, None).await
    }

    // =============================================================================
    // Account
    // =============================================================================

    /// Check that the configured API key is accepted
    ///
    /// The service answers `/info` with `success: false` for unknown keys
    /// instead of a 401, so both are reported as [`ClientError::Auth`].
    ///
    /// # Returns
    /// The account information payload
    pub async fn verify_credentials(&self) -> Result<serde_json::Value> {
        let url = format!("{}/info", self.base_url);
        let response = self.send(Method::GET, &url, None).await?;

        let info: InfoResponse = self.parse_json(&response)?;
        if info.success == Some(false) {
            return Err(ClientError::Auth(
                "Could not authenticate with the provided credentials".to_string(),
            ));
        }

        self.parse_json(&response)
    }
}
