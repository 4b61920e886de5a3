//! Admin handlers: manual credits, refunds, and the legacy credit migration.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use mesh_wallet_core::{AgentSlug, UserId};
use mesh_wallet_store::Store;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Manual credit request.
#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    /// User ID to credit.
    pub user_id: String,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Reason for the credit.
    pub reason: String,
}

/// Mutation response shared by the admin endpoints.
#[derive(Debug, Serialize)]
pub struct AdminMutationResponse {
    /// Wallet balance after the mutation, in cents.
    pub wallet_balance_cents: i64,
    /// The recorded transaction.
    pub transaction_id: String,
}

/// Manually credit a user's wallet.
///
/// Recorded as a `top_up` without a Checkout session, so it bypasses the
/// session dedup; repeated calls credit repeatedly by design.
pub async fn credit(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<CreditRequest>,
) -> Result<Json<AdminMutationResponse>, ApiError> {
    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    if body.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("Reason is required".into()));
    }

    let tx = state
        .store
        .credit_manual(&user_id, body.amount_cents, body.reason.trim())?;

    tracing::info!(
        admin_id = %admin.admin_id,
        user_id = %user_id,
        amount_cents = %body.amount_cents,
        reason = %body.reason,
        new_balance = %tx.balance_after_cents,
        "Manual credit applied"
    );

    Ok(Json(AdminMutationResponse {
        wallet_balance_cents: tx.balance_after_cents,
        transaction_id: tx.id.to_string(),
    }))
}

/// Refund request.
#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    /// User ID to refund.
    pub user_id: String,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Reason for the refund.
    pub reason: String,
    /// The agent the refunded charge related to, if any.
    pub agent_slug: Option<String>,
}

/// Refund a user's wallet.
pub async fn refund(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<RefundRequest>,
) -> Result<Json<AdminMutationResponse>, ApiError> {
    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    if body.reason.trim().is_empty() {
        return Err(ApiError::BadRequest("Reason is required".into()));
    }

    let agent_slug = body
        .agent_slug
        .as_deref()
        .map(AgentSlug::new)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid agent slug".into()))?;

    let tx = state.store.credit_refund(
        &user_id,
        body.amount_cents,
        agent_slug.as_ref(),
        body.reason.trim(),
    )?;

    tracing::info!(
        admin_id = %admin.admin_id,
        user_id = %user_id,
        amount_cents = %body.amount_cents,
        reason = %body.reason,
        new_balance = %tx.balance_after_cents,
        "Refund applied"
    );

    Ok(Json(AdminMutationResponse {
        wallet_balance_cents: tx.balance_after_cents,
        transaction_id: tx.id.to_string(),
    }))
}

/// Legacy migration request.
#[derive(Debug, Deserialize)]
pub struct MigrateCreditsRequest {
    /// User ID to migrate.
    pub user_id: String,
}

/// Legacy migration response.
#[derive(Debug, Serialize)]
pub struct MigrateCreditsResponse {
    /// Whether any credits were migrated (false when already at zero).
    pub migrated: bool,
    /// Wallet balance after migration, in cents.
    pub wallet_balance_cents: i64,
    /// The recorded transaction, when credits were migrated.
    pub transaction_id: Option<String>,
}

/// Fold a user's frozen legacy credits into their wallet.
pub async fn migrate_credits(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(body): Json<MigrateCreditsRequest>,
) -> Result<Json<MigrateCreditsResponse>, ApiError> {
    let user_id: UserId = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let migrated_tx = state.store.migrate_legacy_credits(&user_id)?;

    let user = state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    if let Some(tx) = &migrated_tx {
        tracing::info!(
            admin_id = %admin.admin_id,
            user_id = %user_id,
            amount_cents = %tx.amount_cents,
            "Legacy credits migrated"
        );
    }

    Ok(Json(MigrateCreditsResponse {
        migrated: migrated_tx.is_some(),
        wallet_balance_cents: user.wallet_balance_cents,
        transaction_id: migrated_tx.map(|tx| tx.id.to_string()),
    }))
}
