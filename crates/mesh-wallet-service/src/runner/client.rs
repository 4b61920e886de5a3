//! Workflow runner client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{DispatchRequest, DispatchResponse, RunResult, RunnerErrorResponse};

/// Error type for runner operations.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Runner returned an error.
    #[error("Runner error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Run not found.
    #[error("run not found: {run_id}")]
    RunNotFound {
        /// The run ID that was not found.
        run_id: String,
    },
}

/// Workflow runner API client.
#[derive(Debug, Clone)]
pub struct RunnerClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RunnerClient {
    /// Create a new runner client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Runner base URL (e.g., `"https://runner.meshlabs.dev"`)
    /// * `api_key` - Optional bearer key for the runner
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Dispatch an invocation to an agent's webhook.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the runner rejects it.
    pub async fn dispatch(
        &self,
        webhook_path: &str,
        request: &DispatchRequest,
    ) -> Result<DispatchResponse, RunnerError> {
        let url = format!("{}{}", self.base_url, webhook_path);

        tracing::debug!(
            url = %url,
            transaction_id = %request.transaction_id,
            "Dispatching agent invocation"
        );

        let mut req = self.client.post(&url).json(request);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.send().await?;
        Self::handle_response(response).await
    }

    /// Fetch the results of a run.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::RunNotFound` for unknown run IDs, or an error
    /// if the request fails.
    pub async fn fetch_run(&self, run_id: &str) -> Result<RunResult, RunnerError> {
        let url = format!("{}/runs/{}", self.base_url, run_id);

        let mut req = self.client.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let response = req.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RunnerError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RunnerError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<RunnerErrorResponse>()
            .await
            .map_or_else(|_| format!("HTTP {status}"), |body| body.message);

        Err(RunnerError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
