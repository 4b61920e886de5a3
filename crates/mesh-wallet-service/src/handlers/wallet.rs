//! Wallet balance, history, and top-up handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use mesh_wallet_core::WalletTransaction;
use mesh_wallet_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::format_cents;
use crate::state::AppState;

/// Minimum top-up amount in dollars.
const MIN_TOPUP_USD: f64 = 5.0;

/// Maximum top-up amount in dollars.
const MAX_TOPUP_USD: f64 = 1000.0;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Wallet balance in cents.
    pub wallet_balance_cents: i64,
    /// Wallet balance formatted as dollars.
    pub wallet_balance_formatted: String,
    /// Frozen legacy credit point balance.
    pub credits: i64,
}

/// Get current wallet balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    Ok(Json(BalanceResponse {
        wallet_balance_cents: user.wallet_balance_cents,
        wallet_balance_formatted: format_cents(user.wallet_balance_cents),
        credits: user.credits,
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Amount in cents (positive = credit, negative = debit).
    pub amount_cents: i64,
    /// Transaction kind.
    pub kind: String,
    /// Balance after this transaction.
    pub balance_after_cents: i64,
    /// Description.
    pub description: String,
    /// Agent slug, for usage debits and their refunds.
    pub agent_slug: Option<String>,
    /// Stripe Checkout session, for payment top-ups.
    pub stripe_session_id: Option<String>,
    /// Timestamp.
    pub created_at: String,
}

impl From<&WalletTransaction> for TransactionResponse {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount_cents: tx.amount_cents,
            kind: tx.kind.as_str().to_string(),
            balance_after_cents: tx.balance_after_cents,
            description: tx.description.clone(),
            agent_slug: tx.agent_slug.as_ref().map(ToString::to_string),
            stripe_session_id: tx.stripe_session_id.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Verify the user exists
    state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions = state
        .store
        .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Top-up request.
#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    /// Amount in dollars to add to the wallet.
    pub amount_usd: f64,
}

/// Top-up response.
#[derive(Debug, Serialize)]
pub struct TopUpResponse {
    /// Stripe Checkout session URL.
    pub checkout_url: String,
    /// Session ID for tracking.
    pub session_id: String,
}

/// Initiate a wallet top-up via Stripe Checkout.
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<TopUpRequest>,
) -> Result<Json<TopUpResponse>, ApiError> {
    // Validate amount
    if !body.amount_usd.is_finite() || body.amount_usd < MIN_TOPUP_USD {
        return Err(ApiError::BadRequest(format!(
            "Minimum top-up is ${MIN_TOPUP_USD}"
        )));
    }
    if body.amount_usd > MAX_TOPUP_USD {
        return Err(ApiError::BadRequest(format!(
            "Maximum top-up is ${MAX_TOPUP_USD}"
        )));
    }

    // Verify Stripe is configured
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

    // Verify the user exists
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    #[allow(clippy::cast_possible_truncation)]
    let amount_cents = (body.amount_usd * 100.0).round() as i64;

    tracing::info!(
        user_id = %auth.user_id,
        amount_usd = %body.amount_usd,
        amount_cents = %amount_cents,
        "Initiating wallet top-up"
    );

    let success_url = format!(
        "{}/wallet/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.config.frontend_url
    );
    let cancel_url = format!("{}/wallet/cancel", state.config.frontend_url);

    let session = stripe
        .create_checkout_session(
            user.stripe_customer_id.as_deref(),
            &auth.user_id.to_string(),
            amount_cents,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create Stripe checkout session");
            ApiError::ExternalService(format!("Failed to create checkout session: {e}"))
        })?;

    let checkout_url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Stripe returned no checkout URL".into()))?;

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session.id,
        "Stripe checkout session created"
    );

    Ok(Json(TopUpResponse {
        checkout_url,
        session_id: session.id,
    }))
}

/// Verify-payment request.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    /// The Checkout session to verify.
    pub session_id: String,
}

/// Verify-payment response.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    /// Whether the session's payment has completed on Stripe's side.
    pub paid: bool,
    /// Whether this call credited the wallet. False when the webhook (or an
    /// earlier verify call) got there first, or the session is unpaid.
    pub credited: bool,
    /// Wallet balance after verification, in cents.
    pub wallet_balance_cents: i64,
}

/// Confirm a Checkout session after redirect and credit the wallet if the
/// webhook has not arrived yet.
///
/// This shares the webhook's dedup path: whichever of the two runs second
/// observes the session marker and leaves the balance alone.
pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    let session = stripe
        .get_checkout_session(&body.session_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, session_id = %body.session_id, "Failed to fetch session");
            ApiError::ExternalService(format!("Failed to fetch checkout session: {e}"))
        })?;

    // The session must belong to the authenticated user.
    if session.client_reference_id.as_deref() != Some(auth.user_id.to_string().as_str()) {
        return Err(ApiError::Forbidden);
    }

    if !session.is_paid() {
        tracing::info!(
            session_id = %session.id,
            payment_status = ?session.payment_status,
            "Session not paid yet"
        );
        return Ok(Json(VerifyPaymentResponse {
            paid: false,
            credited: false,
            wallet_balance_cents: user.wallet_balance_cents,
        }));
    }

    let amount_cents = session
        .wallet_amount_cents()
        .ok_or_else(|| ApiError::ExternalService("Session has no amount".into()))?;

    let description = format!(
        "Wallet top-up of {} via Stripe (session: {})",
        format_cents(amount_cents),
        session.id
    );

    match state
        .store
        .credit_top_up(&auth.user_id, amount_cents, &session.id, &description)
    {
        Ok(tx) => {
            tracing::info!(
                user_id = %auth.user_id,
                session_id = %session.id,
                amount_cents = %amount_cents,
                new_balance = %tx.balance_after_cents,
                "Wallet credited via payment verification"
            );
            Ok(Json(VerifyPaymentResponse {
                paid: true,
                credited: true,
                wallet_balance_cents: tx.balance_after_cents,
            }))
        }
        Err(StoreError::DuplicateSession { session_id }) => {
            tracing::info!(
                user_id = %auth.user_id,
                session_id = %session_id,
                "Session already credited"
            );
            let user = state
                .store
                .get_user(&auth.user_id)?
                .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;
            Ok(Json(VerifyPaymentResponse {
                paid: true,
                credited: false,
                wallet_balance_cents: user.wallet_balance_cents,
            }))
        }
        Err(e) => Err(e.into()),
    }
}
