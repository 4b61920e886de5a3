//! Stripe webhook handler.
//!
//! The webhook is the authoritative path for crediting completed payments.
//! Replays are expected (Stripe retries until it sees a 2xx), so every
//! outcome that must not be retried answers 200, including a session that
//! was already credited.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use mesh_wallet_core::{User, UserId};
use mesh_wallet_store::{Store, StoreError};

use crate::error::ApiError;
use crate::handlers::format_cents;
use crate::state::AppState;
use crate::stripe::CheckoutSession;

/// Stripe webhook event envelope.
#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event ID.
    pub id: String,
    /// Event data.
    pub data: StripeEventData,
}

/// Stripe event data container.
#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// Event object.
    pub object: serde_json::Value,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Verify signature if a webhook secret is configured
    if state.config.stripe_webhook_secret.is_some() {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

        let stripe = state
            .stripe
            .as_ref()
            .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

        stripe
            .verify_webhook_signature(&body, signature, chrono::Utc::now().timestamp())
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid Stripe webhook signature");
                ApiError::BadRequest("Invalid webhook signature".into())
            })?;
    } else {
        // No webhook secret configured - skip verification (development mode)
        tracing::warn!("Stripe webhook secret not configured - skipping signature verification");
    }

    // Parse webhook payload
    let webhook: StripeWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "Received Stripe webhook"
    );

    match webhook.event_type.as_str() {
        "checkout.session.completed" => {
            handle_checkout_completed(&state, webhook.data.object).await?;
        }
        _ => {
            tracing::debug!(event_type = %webhook.event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// Credit a completed Checkout session to the owning user's wallet.
async fn handle_checkout_completed(
    state: &AppState,
    object: serde_json::Value,
) -> Result<(), ApiError> {
    let session: CheckoutSession = serde_json::from_value(object)
        .map_err(|e| ApiError::BadRequest(format!("Malformed checkout session: {e}")))?;

    // Only process if payment is complete; Stripe sends a follow-up event
    // for async payment methods.
    if !session.is_paid() {
        tracing::info!(
            session_id = %session.id,
            payment_status = ?session.payment_status,
            "Checkout session not paid yet, skipping"
        );
        return Ok(());
    }

    let user = resolve_user(state, &session)?;

    let amount_cents = session
        .wallet_amount_cents()
        .ok_or_else(|| ApiError::BadRequest("Session has no amount".into()))?;

    let description = format!(
        "Wallet top-up of {} via Stripe (session: {})",
        format_cents(amount_cents),
        session.id
    );

    match state
        .store
        .credit_top_up(&user.id, amount_cents, &session.id, &description)
    {
        Ok(tx) => {
            tracing::info!(
                user_id = %user.id,
                session_id = %session.id,
                amount_cents = %amount_cents,
                new_balance = %tx.balance_after_cents,
                transaction_id = %tx.id,
                "Wallet credited from Stripe checkout"
            );
            Ok(())
        }
        // A retry of an already-credited session is a success: answering
        // with an error would make Stripe keep retrying forever.
        Err(StoreError::DuplicateSession { session_id }) => {
            tracing::info!(
                user_id = %user.id,
                session_id = %session_id,
                "Session already credited, ignoring replay"
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve the paying user from a Checkout session.
///
/// `client_reference_id` carries our user ID; sessions created outside the
/// top-up endpoint (e.g. payment links) may only carry the checkout email,
/// so fall back to the email index.
fn resolve_user(state: &AppState, session: &CheckoutSession) -> Result<User, ApiError> {
    if let Some(reference) = session.client_reference_id.as_deref() {
        let user_id: UserId = reference
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("Invalid user reference: {reference}")))?;

        return state
            .store
            .get_user(&user_id)?
            .ok_or_else(|| ApiError::NotFound(format!("User not found: {reference}")));
    }

    let email = session
        .customer_details
        .as_ref()
        .and_then(|d| d.email.as_deref())
        .ok_or_else(|| {
            ApiError::BadRequest("Session has neither client_reference_id nor email".into())
        })?;

    state
        .store
        .get_user_by_email(email)?
        .ok_or_else(|| ApiError::NotFound(format!("No user registered for {email}")))
}
