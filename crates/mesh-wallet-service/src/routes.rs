//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, agents, health, users, wallet, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Users (JWT auth)
/// - `POST /v1/users` - Register the authenticated user
/// - `GET /v1/users/me` - Get current user
///
/// ## Wallet (JWT auth)
/// - `GET /v1/wallet/balance` - Current balance
/// - `GET /v1/wallet/transactions` - Transaction history
/// - `POST /v1/wallet/topup` - Start a Stripe Checkout top-up
/// - `POST /v1/wallet/verify-payment` - Confirm a session after redirect
///
/// ## Agents (JWT auth)
/// - `GET /v1/agents` - Catalog listing
/// - `POST /v1/agents/{slug}/invoke` - Charge and dispatch an invocation
/// - `GET /v1/agents/{slug}/runs/{run_id}` - Fetch run results
///
/// ## Admin (`x-admin-key`)
/// - `POST /v1/admin/credit` - Manual credit
/// - `POST /v1/admin/refund` - Refund
/// - `POST /v1/admin/migrate-credits` - Legacy credit migration
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/stripe` - Stripe webhooks
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Users
        .route("/users", post(users::register))
        .route("/users/me", get(users::get_me))
        // Wallet
        .route("/wallet/balance", get(wallet::get_balance))
        .route("/wallet/transactions", get(wallet::list_transactions))
        .route("/wallet/topup", post(wallet::top_up))
        .route("/wallet/verify-payment", post(wallet::verify_payment))
        // Agents
        .route("/agents", get(agents::list_agents))
        .route("/agents/:slug/invoke", post(agents::invoke_agent))
        .route("/agents/:slug/runs/:run_id", get(agents::get_run))
        // Admin
        .route("/admin/credit", post(admin::credit))
        .route("/admin/refund", post(admin::refund))
        .route("/admin/migrate-credits", post(admin::migrate_credits))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - volume is controlled by Stripe)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
