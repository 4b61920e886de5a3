//! Mesh-Wallet HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    AgentSummary, ApiErrorResponse, BalanceResponse, InvokeReceipt, InvokeRequest,
    ListAgentsResponse, ListTransactionsResponse, RunResult, TopUpRequest, TopUpResponse,
    TransactionSummary, VerifyPaymentRequest, VerifyPaymentResponse,
};

/// Options for building a [`MeshWalletClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

/// Mesh-Wallet API client.
///
/// Each client carries one bearer token and acts as that user.
#[derive(Debug, Clone)]
pub struct MeshWalletClient {
    client: Client,
    base_url: String,
    bearer_token: String,
}

impl MeshWalletClient {
    /// Create a new mesh-wallet client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., `"http://mesh-wallet:8080"`)
    /// * `bearer_token` - JWT bearer token for the acting user
    #[must_use]
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        Self::with_options(base_url, bearer_token, ClientOptions::default())
    }

    /// Create a new mesh-wallet client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }

    /// Get the current wallet balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_balance(&self) -> Result<BalanceResponse, ClientError> {
        let url = format!("{}/v1/wallet/balance", self.base_url);
        let response = self.client.get(&url).bearer_auth(&self.bearer_token).send().await?;
        Self::handle_response(response).await
    }

    /// List wallet transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<TransactionSummary>, ClientError> {
        let url = format!(
            "{}/v1/wallet/transactions?limit={limit}&offset={offset}",
            self.base_url
        );
        let response = self.client.get(&url).bearer_auth(&self.bearer_token).send().await?;
        let page: ListTransactionsResponse = Self::handle_response(response).await?;
        Ok(page.transactions)
    }

    /// Start a wallet top-up; returns the Checkout URL to redirect to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn top_up(&self, amount_usd: f64) -> Result<TopUpResponse, ClientError> {
        let url = format!("{}/v1/wallet/topup", self.base_url);
        tracing::debug!(amount_usd = %amount_usd, "Starting wallet top-up");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&TopUpRequest { amount_usd })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Verify a Checkout session after redirect.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn verify_payment(
        &self,
        session_id: impl Into<String>,
    ) -> Result<VerifyPaymentResponse, ClientError> {
        let url = format!("{}/v1/wallet/verify-payment", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&VerifyPaymentRequest {
                session_id: session_id.into(),
            })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// List the agent catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_agents(&self) -> Result<Vec<AgentSummary>, ClientError> {
        let url = format!("{}/v1/agents", self.base_url);
        let response = self.client.get(&url).bearer_auth(&self.bearer_token).send().await?;
        let catalog: ListAgentsResponse = Self::handle_response(response).await?;
        Ok(catalog.agents)
    }

    /// Invoke an agent, paying from the wallet.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InsufficientFunds`] when the balance does not
    /// cover the agent's price, or another error if the request fails.
    pub async fn invoke_agent(
        &self,
        slug: &str,
        input: serde_json::Value,
    ) -> Result<InvokeReceipt, ClientError> {
        let url = format!("{}/v1/agents/{slug}/invoke", self.base_url);
        tracing::debug!(agent = %slug, "Invoking agent");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&InvokeRequest { input })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Fetch run results.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_run(&self, slug: &str, run_id: &str) -> Result<RunResult, ClientError> {
        let url = format!("{}/v1/agents/{slug}/runs/{run_id}", self.base_url);
        let response = self.client.get(&url).bearer_auth(&self.bearer_token).send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: Result<ApiErrorResponse, _> = serde_json::from_str(&body);

        match parsed {
            Ok(api_error) => {
                // Surface 402s as a typed error so callers can prompt a top-up
                if api_error.error.code == "insufficient_funds" {
                    let details = api_error.error.details.unwrap_or_default();
                    return Err(ClientError::InsufficientFunds {
                        balance: details.get("balance").and_then(serde_json::Value::as_i64).unwrap_or(0),
                        required: details.get("required").and_then(serde_json::Value::as_i64).unwrap_or(0),
                    });
                }
                Err(ClientError::Api {
                    status: status.as_u16(),
                    code: api_error.error.code,
                    message: api_error.error.message,
                })
            }
            Err(_) => Err(ClientError::UnexpectedResponse(format!(
                "HTTP {status}: {body}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> MeshWalletClient {
        MeshWalletClient::new(server.uri(), "user-jwt")
    }

    #[tokio::test]
    async fn get_balance_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/wallet/balance"))
            .and(header("authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "wallet_balance_cents": 2500,
                "wallet_balance_formatted": "$25.00",
                "credits": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let balance = test_client(&server).get_balance().await.unwrap();
        assert_eq!(balance.wallet_balance_cents, 2500);
        assert_eq!(balance.wallet_balance_formatted, "$25.00");
    }

    #[tokio::test]
    async fn list_transactions_passes_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/wallet/transactions"))
            .and(query_param("limit", "10"))
            .and(query_param("offset", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transactions": [{
                    "id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                    "amount_cents": -150,
                    "kind": "agent_usage",
                    "balance_after_cents": 2350,
                    "description": "Invoked Lead Enricher (lead-enricher)",
                    "agent_slug": "lead-enricher",
                    "created_at": "2025-06-01T00:00:00Z"
                }],
                "has_more": false
            })))
            .mount(&server)
            .await;

        let transactions = test_client(&server).list_transactions(10, 20).await.unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, mesh_wallet_core::TransactionKind::AgentUsage);
        assert_eq!(transactions[0].agent_slug.as_deref(), Some("lead-enricher"));
    }

    #[tokio::test]
    async fn invoke_agent_posts_input() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/agents/lead-enricher/invoke"))
            .and(body_partial_json(serde_json::json!({
                "input": {"domain": "example.com"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "run_id": "run_123",
                "transaction_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
                "charged_cents": 150,
                "wallet_balance_cents": 2350
            })))
            .mount(&server)
            .await;

        let receipt = test_client(&server)
            .invoke_agent("lead-enricher", serde_json::json!({"domain": "example.com"}))
            .await
            .unwrap();
        assert_eq!(receipt.run_id, "run_123");
        assert_eq!(receipt.charged_cents, 150);
    }

    #[tokio::test]
    async fn insufficient_funds_is_typed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/agents/lead-enricher/invoke"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": {
                    "code": "insufficient_funds",
                    "message": "insufficient funds: balance=100, required=150",
                    "details": {"balance": 100, "required": 150}
                }
            })))
            .mount(&server)
            .await;

        let result = test_client(&server)
            .invoke_agent("lead-enricher", serde_json::Value::Null)
            .await;

        match result {
            Err(ClientError::InsufficientFunds { balance, required }) => {
                assert_eq!(balance, 100);
                assert_eq!(required, 150);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_errors_carry_code_and_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/wallet/balance"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "not_found", "message": "User not registered"}
            })))
            .mount(&server)
            .await;

        let result = test_client(&server).get_balance().await;
        match result {
            Err(ClientError::Api { status, code, message }) => {
                assert_eq!(status, 404);
                assert_eq!(code, "not_found");
                assert_eq!(message, "User not registered");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_is_unexpected_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/wallet/balance"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let result = test_client(&server).get_balance().await;
        assert!(matches!(result, Err(ClientError::UnexpectedResponse(_))));
    }
}
