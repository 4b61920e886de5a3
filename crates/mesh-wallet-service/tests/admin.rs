//! Admin endpoint integration tests.

mod common;

use common::{TestHarness, TEST_ADMIN_KEY};
use serde_json::json;

#[tokio::test]
async fn admin_credit_requires_key() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let body = json!({
        "user_id": harness.test_user_id.to_string(),
        "amount_cents": 1000,
        "reason": "Goodwill"
    });

    // No key
    harness
        .server
        .post("/v1/admin/credit")
        .json(&body)
        .await
        .assert_status_unauthorized();

    // Wrong key
    harness
        .server
        .post("/v1/admin/credit")
        .add_header("x-admin-key", "wrong-key")
        .json(&body)
        .await
        .assert_status_unauthorized();

    // Right key
    let response = harness
        .server
        .post("/v1/admin/credit")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&body)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["wallet_balance_cents"], 1000);
}

#[tokio::test]
async fn admin_credit_rejects_bad_input() {
    let harness = TestHarness::new();
    harness.register_user().await;

    // Non-positive amount
    harness
        .server
        .post("/v1/admin/credit")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount_cents": -100,
            "reason": "Nope"
        }))
        .await
        .assert_status_bad_request();

    // Missing reason
    harness
        .server
        .post("/v1/admin/credit")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount_cents": 100,
            "reason": "  "
        }))
        .await
        .assert_status_bad_request();

    // Unknown user
    harness
        .server
        .post("/v1/admin/credit")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "user_id": mesh_wallet_core::UserId::generate().to_string(),
            "amount_cents": 100,
            "reason": "Ghost"
        }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn admin_refund_restores_balance() {
    let harness = TestHarness::new();
    harness.register_user().await;
    harness.fund_wallet(1000).await;

    let response = harness
        .server
        .post("/v1/admin/refund")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount_cents": 150,
            "reason": "Run produced empty results",
            "agent_slug": "lead-enricher"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["wallet_balance_cents"], 1150);

    let history = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = history.json();
    let newest = &body["transactions"][0];
    assert_eq!(newest["kind"], "refund");
    assert_eq!(newest["agent_slug"], "lead-enricher");
}

#[tokio::test]
async fn migrate_credits_folds_legacy_balance_once() {
    use mesh_wallet_store::Store;

    let harness = TestHarness::new();
    harness.register_user().await;

    // Seed a legacy credit balance directly in the store, the way imported
    // accounts arrive.
    let mut user = harness
        .store
        .get_user(&harness.test_user_id)
        .unwrap()
        .unwrap();
    user.credits = 250;
    harness.store.put_user(&user).unwrap();

    let response = harness
        .server
        .post("/v1/admin/migrate-credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({"user_id": harness.test_user_id.to_string()}))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["migrated"], true);
    assert_eq!(body["wallet_balance_cents"], 250);
    assert!(body["transaction_id"].is_string());

    // Credits are zeroed and visible through the balance endpoint
    let balance = harness
        .server
        .get("/v1/wallet/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = balance.json();
    assert_eq!(body["wallet_balance_cents"], 250);
    assert_eq!(body["credits"], 0);

    // Second migration is a no-op
    let response = harness
        .server
        .post("/v1/admin/migrate-credits")
        .add_header("x-admin-key", TEST_ADMIN_KEY)
        .json(&json!({"user_id": harness.test_user_id.to_string()}))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["migrated"], false);
    assert_eq!(body["wallet_balance_cents"], 250);
}
