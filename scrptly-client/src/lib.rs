//! Scrptly HTTP Client
//!
//! Authenticated gateway to the Scrptly generation API.
//!
//! Every call goes through [`ScrptlyClient::send`], which attaches the bearer
//! token from the injected [`CredentialProvider`], hands the request to the
//! injected [`HttpTransport`], and maps the response status onto
//! [`ClientError`]. The gateway never retries; retry policy belongs to the
//! caller so that submission and polling can differ.
//!
//! # Example
//!
//! ```no_run
//! use scrptly_client::{ScrptlyClient, StaticToken};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScrptlyClient::new("https://api.scrptly.com", StaticToken::new("my-key"));
//!
//!     let info = client.verify_credentials().await?;
//!     println!("Account: {}", info);
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod error;
mod jobs;
pub mod transport;

// Re-export commonly used types
pub use credentials::{CredentialProvider, EnvToken, StaticToken};
pub use error::{ClientError, Result};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

#[cfg(any(test, feature = "test-util"))]
pub use transport::ScriptedTransport;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Default base URL of the generation API
pub const DEFAULT_API_URL: &str = "https://api.scrptly.com";

/// HTTP gateway for the Scrptly API
#[derive(Clone)]
pub struct ScrptlyClient {
    /// Base URL of the API (e.g., "https://api.scrptly.com")
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for ScrptlyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrptlyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ScrptlyClient {
    /// Create a new client using the default `reqwest` transport
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API
    /// * `credentials` - Source of the bearer token
    ///
    /// # Example
    /// ```
    /// use scrptly_client::{ScrptlyClient, StaticToken};
    ///
    /// let client = ScrptlyClient::new("https://api.scrptly.com", StaticToken::new("key"));
    /// ```
    pub fn new(base_url: impl Into<String>, credentials: impl CredentialProvider + 'static) -> Self {
        Self::with_transport(
            base_url,
            Arc::new(ReqwestTransport::new()),
            Arc::new(credentials),
        )
    }

    /// Create a new client with a custom transport
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, or
    /// replace the network entirely in tests.
    pub fn with_transport(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            credentials,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one authenticated request
    ///
    /// # Errors
    /// * [`ClientError::Auth`] - no usable credential, or the service answered 401/403
    /// * [`ClientError::Transport`] - the request never produced an HTTP response
    /// * [`ClientError::Remote`] - any other non-2xx response
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        let token = self.credentials.bearer_token().await?;
        if token.trim().is_empty() {
            return Err(ClientError::Auth("API key is empty".to_string()));
        }

        let mut request = HttpRequest::new(method, url)
            .header(AUTHORIZATION.as_str(), format!("Bearer {}", token))
            .header(ACCEPT.as_str(), "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %request.method, url = %request.url, "Sending request");

        let response = self.transport.send(request).await?;
        self.handle_response(response)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Map the response status onto the error taxonomy
    fn handle_response(&self, response: HttpResponse) -> Result<HttpResponse> {
        match response.status {
            401 | 403 => Err(ClientError::Auth(format!(
                "credential rejected (status {})",
                response.status
            ))),
            _ if !response.is_success() => {
                Err(ClientError::remote(response.status, response.body))
            }
            _ => Ok(response),
        }
    }

    /// Deserialize a successful response body
    fn parse_json<T: DeserializeOwned>(&self, response: &HttpResponse) -> Result<T> {
        serde_json::from_str(&response.body)
            .map_err(|e| ClientError::Parse(format!("Failed to parse JSON response: {}", e)))
    }
}
