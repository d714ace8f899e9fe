//! REST API client for the provider task endpoints.
//!
//! Wraps the provider HTTP API (task submission, status retrieval) using
//! [`reqwest`]. Every request carries the configured per-request timeout so
//! an unresponsive provider cannot stall a batch indefinitely.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::types::{SubmitResponse, TaskStatusResponse};

/// Default per-request timeout. Generation providers routinely take
/// minutes to accept work under load, so this is deliberately generous.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base HTTP URL, e.g. `https://api.provider.example`.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header, if required.
    pub api_key: Option<String>,
    /// Client-side timeout applied to each individual request.
    pub request_timeout: Duration,
}

impl ProviderConfig {
    /// Configuration with the default request timeout.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Errors from the provider REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ProviderError {
    /// HTTP status carried by the error, when one exists.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ProviderError::Request(e) => e.status().map(|s| s.as_u16()),
            ProviderError::Api { status, .. } => Some(*status),
        }
    }

    /// Whether a retry can plausibly succeed.
    ///
    /// Transport failures and timeouts are retryable; HTTP responses are
    /// classified by [`is_retryable_status`].
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Request(e) => match e.status() {
                Some(status) => is_retryable_status(status.as_u16()),
                None => true,
            },
            ProviderError::Api { status, .. } => is_retryable_status(*status),
        }
    }
}

/// Whether an HTTP status code indicates a transient condition.
///
/// 408 (request timeout), 429 (rate limited), and all 5xx are transient;
/// every other 4xx is a terminal request defect that retrying cannot fix.
pub fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// HTTP client for a single provider.
pub struct ProviderApi {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderApi {
    /// Create a new API client for a provider.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across multiple providers).
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    /// Submit a generation task.
    ///
    /// Sends a `POST /v1/tasks` request with the given payload. Returns
    /// the server-assigned `task_id`.
    pub async fn submit_task(
        &self,
        payload: &serde_json::Value,
    ) -> Result<SubmitResponse, ProviderError> {
        let request = self
            .client
            .post(format!("{}/v1/tasks", self.config.base_url))
            .timeout(self.config.request_timeout)
            .json(payload);

        let response = self.authorize(request).send().await?;
        Self::parse_response(response).await
    }

    /// Retrieve the current status of a task.
    ///
    /// Sends a `GET /v1/tasks/{task_id}` request.
    pub async fn get_task_status(
        &self,
        task_id: &str,
    ) -> Result<TaskStatusResponse, ProviderError> {
        let request = self
            .client
            .get(format!("{}/v1/tasks/{}", self.config.base_url, task_id))
            .timeout(self.config.request_timeout);

        let response = self.authorize(request).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Attach the bearer token, when one is configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`ProviderError::Api`] containing the
    /// status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
