//! Stripe webhook integration tests.
//!
//! These post signed `checkout.session.completed` payloads and assert the
//! crediting behavior: exactly-once per session, unpaid sessions skipped,
//! bad signatures rejected.

mod common;

use common::{checkout_completed_event, stripe_signature, TestHarness};

async fn balance_of(harness: &TestHarness) -> i64 {
    let response = harness
        .server
        .get("/v1/wallet/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["wallet_balance_cents"].as_i64().unwrap()
}

#[tokio::test]
async fn checkout_completed_credits_wallet() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user();

    let body = checkout_completed_event(&harness.test_user_id, "cs_test_1", 2500, "paid");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&body))
        .content_type("application/json")
        .text(body)
        .await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["received"], true);

    assert_eq!(balance_of(&harness).await, 2500);
}

#[tokio::test]
async fn webhook_replay_credits_once() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user();

    let body = checkout_completed_event(&harness.test_user_id, "cs_test_replay", 2500, "paid");

    for _ in 0..3 {
        // Stripe retries deliver the same event; all must be 200s
        let response = harness
            .server
            .post("/webhooks/stripe")
            .add_header("stripe-signature", stripe_signature(&body))
            .content_type("application/json")
            .text(body.clone())
            .await;
        response.assert_status_ok();
    }

    assert_eq!(balance_of(&harness).await, 2500);
}

#[tokio::test]
async fn webhook_and_verify_share_dedup() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user();

    // Two distinct sessions credit independently
    for (session, amount) in [("cs_a", 1000), ("cs_b", 500)] {
        let body = checkout_completed_event(&harness.test_user_id, session, amount, "paid");
        harness
            .server
            .post("/webhooks/stripe")
            .add_header("stripe-signature", stripe_signature(&body))
            .content_type("application/json")
            .text(body)
            .await
            .assert_status_ok();
    }

    assert_eq!(balance_of(&harness).await, 1500);

    // History shows both top-ups with their session IDs
    let response = harness
        .server
        .get("/v1/wallet/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert!(transactions
        .iter()
        .all(|tx| tx["kind"] == "top_up" && !tx["stripe_session_id"].is_null()));
}

#[tokio::test]
async fn unpaid_session_is_skipped() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user();

    let body = checkout_completed_event(&harness.test_user_id, "cs_unpaid", 2500, "unpaid");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&body))
        .content_type("application/json")
        .text(body)
        .await;

    // Acknowledged, but nothing credited
    response.assert_status_ok();
    assert_eq!(balance_of(&harness).await, 0);
}

#[tokio::test]
async fn missing_signature_rejected() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user();

    let body = checkout_completed_event(&harness.test_user_id, "cs_test_1", 2500, "paid");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .content_type("application/json")
        .text(body)
        .await;

    response.assert_status_bad_request();
    assert_eq!(balance_of(&harness).await, 0);
}

#[tokio::test]
async fn tampered_body_rejected() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user();

    let body = checkout_completed_event(&harness.test_user_id, "cs_test_1", 2500, "paid");
    let signature = stripe_signature(&body);

    // Sign one amount, deliver another
    let tampered = checkout_completed_event(&harness.test_user_id, "cs_test_1", 999_900, "paid");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", signature)
        .content_type("application/json")
        .text(tampered)
        .await;

    response.assert_status_bad_request();
    assert_eq!(balance_of(&harness).await, 0);
}

#[tokio::test]
async fn unhandled_event_types_are_acknowledged() {
    let harness = TestHarness::with_webhook_secret();

    let body = serde_json::json!({
        "id": "evt_other",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_123"}}
    })
    .to_string();

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&body))
        .content_type("application/json")
        .text(body)
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn session_without_reference_resolves_by_email() {
    let harness = TestHarness::with_webhook_secret();
    harness.seed_user_with_email("ada@example.com");

    // Payment-link style session: no client_reference_id, only the
    // checkout email (with different casing)
    let body = serde_json::json!({
        "id": "evt_email_fallback",
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": "cs_email_fallback",
                "payment_status": "paid",
                "amount_total": 1200,
                "customer_details": {"email": "Ada@Example.com"}
            }
        }
    })
    .to_string();

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&body))
        .content_type("application/json")
        .text(body)
        .await;

    response.assert_status_ok();
    assert_eq!(balance_of(&harness).await, 1200);
}

#[tokio::test]
async fn unknown_user_reference_is_not_found() {
    let harness = TestHarness::with_webhook_secret();

    let stranger = mesh_wallet_core::UserId::generate();
    let body = checkout_completed_event(&stranger, "cs_stranger", 2500, "paid");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&body))
        .content_type("application/json")
        .text(body)
        .await;

    response.assert_status_not_found();
}
