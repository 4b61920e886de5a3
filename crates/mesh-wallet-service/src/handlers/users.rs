//! User registration and lookup handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use mesh_wallet_core::User;
use mesh_wallet_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::format_cents;
use crate::state::AppState;

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Wallet balance in cents.
    pub wallet_balance_cents: i64,
    /// Wallet balance formatted as dollars.
    pub wallet_balance_formatted: String,
    /// Frozen legacy credit point balance.
    pub credits: i64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            wallet_balance_cents: user.wallet_balance_cents,
            wallet_balance_formatted: format_cents(user.wallet_balance_cents),
            credits: user.credits,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
}

/// Register the authenticated user.
pub async fn register(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if body.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".into()));
    }

    // Check if the user is already registered
    if state.store.get_user(&auth.user_id)?.is_some() {
        return Err(ApiError::Conflict("User already registered".into()));
    }

    let mut user = User::new(auth.user_id, body.email.trim(), body.name);

    // Create the Stripe customer up front so top-ups can reuse it
    if let Some(stripe) = &state.stripe {
        match stripe
            .create_customer(
                &auth.user_id.to_string(),
                Some(&user.email),
                user.name.as_deref(),
            )
            .await
        {
            Ok(customer) => {
                tracing::info!(
                    user_id = %auth.user_id,
                    stripe_id = %customer.id,
                    "Stripe customer created"
                );
                user.stripe_customer_id = Some(customer.id);
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %auth.user_id,
                    error = %e,
                    "Failed to create Stripe customer - continuing without"
                );
            }
        }
    }

    state.store.put_user(&user)?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    Ok(Json(UserResponse::from(&user)))
}

/// Get the authenticated user's record.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    Ok(Json(UserResponse::from(&user)))
}
