//! Agent catalog and invocation handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use mesh_wallet_core::{AgentListing, AgentSlug};
use mesh_wallet_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::format_cents;
use crate::runner::{DispatchRequest, RunResult};
use crate::state::AppState;

/// Catalog entry response.
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    /// Routing slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Price per invocation in cents.
    pub price_cents: i64,
    /// Price formatted as dollars.
    pub price_formatted: String,
}

impl From<&AgentListing> for AgentResponse {
    fn from(listing: &AgentListing) -> Self {
        Self {
            slug: listing.slug.to_string(),
            name: listing.name.clone(),
            description: listing.description.clone(),
            price_cents: listing.price_cents,
            price_formatted: format_cents(listing.price_cents),
        }
    }
}

/// Catalog response.
#[derive(Debug, Serialize)]
pub struct ListAgentsResponse {
    /// All invocable agents, sorted by slug.
    pub agents: Vec<AgentResponse>,
}

/// List the agent catalog.
pub async fn list_agents(State(state): State<Arc<AppState>>) -> Json<ListAgentsResponse> {
    let agents = state
        .config
        .catalog
        .listings()
        .into_iter()
        .map(AgentResponse::from)
        .collect();

    Json(ListAgentsResponse { agents })
}

/// Invocation request.
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    /// Agent-specific input forwarded to the runner.
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Invocation receipt.
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    /// Run identifier assigned by the runner.
    pub run_id: String,
    /// The usage transaction that paid for the run.
    pub transaction_id: String,
    /// Amount charged in cents.
    pub charged_cents: i64,
    /// Wallet balance after the charge, in cents.
    pub wallet_balance_cents: i64,
}

/// Invoke an agent: debit the wallet, then dispatch to the runner.
///
/// The debit happens first because it is local and cheap to reverse; if the
/// dispatch then fails, a compensating refund is recorded before the error
/// is returned, so the caller is never charged for a run that did not start.
pub async fn invoke_agent(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(slug): Path<String>,
    Json(body): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let slug: AgentSlug = slug
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid agent slug: {slug}")))?;

    let listing = state
        .config
        .catalog
        .get(&slug)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown agent: {slug}")))?
        .clone();

    let runner = state
        .runner
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Runner not configured".into()))?;

    // Verify the user exists before charging
    state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not registered".into()))?;

    // Charge the wallet. Insufficient funds surfaces as 402 with the
    // balance/required breakdown.
    let description = format!("Invoked {} ({})", listing.name, slug);
    let tx = state
        .store
        .debit_agent_usage(&auth.user_id, listing.price_cents, &slug, &description)?;

    tracing::info!(
        user_id = %auth.user_id,
        agent = %slug,
        charged_cents = %listing.price_cents,
        transaction_id = %tx.id,
        "Wallet charged for agent invocation"
    );

    let request = DispatchRequest {
        user_id: auth.user_id.to_string(),
        transaction_id: tx.id.to_string(),
        input: body.input,
    };

    match runner.dispatch(&listing.webhook_path, &request).await {
        Ok(dispatch) => {
            tracing::info!(
                user_id = %auth.user_id,
                agent = %slug,
                run_id = %dispatch.run_id,
                "Agent invocation dispatched"
            );
            Ok(Json(InvokeResponse {
                run_id: dispatch.run_id,
                transaction_id: tx.id.to_string(),
                charged_cents: listing.price_cents,
                wallet_balance_cents: tx.balance_after_cents,
            }))
        }
        Err(e) => {
            tracing::error!(
                user_id = %auth.user_id,
                agent = %slug,
                error = %e,
                "Dispatch failed, refunding charge"
            );

            let refund = state.store.credit_refund(
                &auth.user_id,
                listing.price_cents,
                Some(&slug),
                &format!("Refund: dispatch of {slug} failed"),
            )?;

            tracing::info!(
                user_id = %auth.user_id,
                agent = %slug,
                refund_transaction_id = %refund.id,
                "Charge refunded after failed dispatch"
            );

            Err(ApiError::ExternalService(format!(
                "Failed to dispatch agent run: {e}"
            )))
        }
    }
}

/// Fetch the results of a run from the runner.
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path((slug, run_id)): Path<(String, String)>,
) -> Result<Json<RunResult>, ApiError> {
    let slug: AgentSlug = slug
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid agent slug: {slug}")))?;

    // Only catalog agents have runs worth proxying
    state
        .config
        .catalog
        .get(&slug)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown agent: {slug}")))?;

    let runner = state
        .runner
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Runner not configured".into()))?;

    let result = runner.fetch_run(&run_id).await.map_err(|e| match e {
        crate::runner::RunnerError::RunNotFound { run_id } => {
            ApiError::NotFound(format!("Run not found: {run_id}"))
        }
        other => ApiError::ExternalService(format!("Failed to fetch run: {other}")),
    })?;

    Ok(Json(result))
}
