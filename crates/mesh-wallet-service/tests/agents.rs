//! Agent catalog and invocation integration tests.
//!
//! Dispatch goes to a wiremock runner so the charge/dispatch/refund flow is
//! exercised end to end.

mod common;

use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_agents_is_sorted_and_priced() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/agents").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let agents = body["agents"].as_array().unwrap();
    assert!(!agents.is_empty());

    let slugs: Vec<&str> = agents.iter().map(|a| a["slug"].as_str().unwrap()).collect();
    let mut sorted = slugs.clone();
    sorted.sort_unstable();
    assert_eq!(slugs, sorted);

    let enricher = agents
        .iter()
        .find(|a| a["slug"] == "lead-enricher")
        .unwrap();
    assert_eq!(enricher["price_cents"], 150);
    assert_eq!(enricher["price_formatted"], "$1.50");
}

#[tokio::test]
async fn invoke_charges_and_dispatches() {
    let runner = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/lead-enricher"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "run_id": "run_123",
            "status": "queued"
        })))
        .expect(1)
        .mount(&runner)
        .await;

    let harness = TestHarness::with_runner(&runner.uri());
    harness.register_user().await;
    harness.fund_wallet(500).await;

    let response = harness
        .server
        .post("/v1/agents/lead-enricher/invoke")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"input": {"domain": "example.com"}}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["run_id"], "run_123");
    assert_eq!(body["charged_cents"], 150);
    assert_eq!(body["wallet_balance_cents"], 350);

    // History shows the usage debit with the agent slug
    let response = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let newest = &body["transactions"][0];
    assert_eq!(newest["kind"], "agent_usage");
    assert_eq!(newest["amount_cents"], -150);
    assert_eq!(newest["agent_slug"], "lead-enricher");
}

#[tokio::test]
async fn invoke_with_insufficient_funds_is_402() {
    let runner = MockServer::start().await;
    let harness = TestHarness::with_runner(&runner.uri());
    harness.register_user().await;
    harness.fund_wallet(100).await; // lead-enricher costs 150

    let response = harness
        .server
        .post("/v1/agents/lead-enricher/invoke")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"input": {}}))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(body["error"]["details"]["balance"], 100);
    assert_eq!(body["error"]["details"]["required"], 150);
}

#[tokio::test]
async fn failed_dispatch_refunds_the_charge() {
    let runner = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/lead-enricher"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "workflow crashed"
        })))
        .mount(&runner)
        .await;

    let harness = TestHarness::with_runner(&runner.uri());
    harness.register_user().await;
    harness.fund_wallet(500).await;

    let response = harness
        .server
        .post("/v1/agents/lead-enricher/invoke")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"input": {}}))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);

    // Balance restored by the compensating refund
    let balance = harness
        .server
        .get("/v1/wallet/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = balance.json();
    assert_eq!(body["wallet_balance_cents"], 500);

    // Both the debit and the refund are in the history
    let response = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions[0]["kind"], "refund");
    assert_eq!(transactions[0]["amount_cents"], 150);
    assert_eq!(transactions[1]["kind"], "agent_usage");
    assert_eq!(transactions[1]["amount_cents"], -150);
}

#[tokio::test]
async fn invoke_unknown_agent_is_not_found() {
    let runner = MockServer::start().await;
    let harness = TestHarness::with_runner(&runner.uri());
    harness.register_user().await;

    let response = harness
        .server
        .post("/v1/agents/no-such-agent/invoke")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"input": {}}))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn invoke_without_runner_does_not_charge() {
    let harness = TestHarness::new();
    harness.register_user().await;
    harness.fund_wallet(500).await;

    let response = harness
        .server
        .post("/v1/agents/lead-enricher/invoke")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({"input": {}}))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);

    let balance = harness
        .server
        .get("/v1/wallet/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = balance.json();
    assert_eq!(body["wallet_balance_cents"], 500);
}

#[tokio::test]
async fn get_run_proxies_results() {
    let runner = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runs/run_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "run_id": "run_123",
            "status": "completed",
            "rows": [{"company": "Example Inc", "employees": 42}]
        })))
        .mount(&runner)
        .await;

    let harness = TestHarness::with_runner(&runner.uri());
    harness.register_user().await;

    let response = harness
        .server
        .get("/v1/agents/lead-enricher/runs/run_123")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["rows"][0]["company"], "Example Inc");
}
