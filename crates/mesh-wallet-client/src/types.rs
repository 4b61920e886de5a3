//! Response types mirrored from the mesh-wallet service API.

use serde::{Deserialize, Serialize};

use mesh_wallet_core::{AgentSlug, TransactionKind};

/// Wallet balance.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// Wallet balance in cents.
    pub wallet_balance_cents: i64,
    /// Wallet balance formatted as dollars.
    pub wallet_balance_formatted: String,
    /// Frozen legacy credit point balance.
    pub credits: i64,
}

/// A wallet transaction summary.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSummary {
    /// Transaction ID.
    pub id: String,
    /// Amount in cents (positive = credit, negative = debit).
    pub amount_cents: i64,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Balance after this transaction.
    pub balance_after_cents: i64,
    /// Description.
    pub description: String,
    /// Agent slug, when the entry relates to an invocation.
    #[serde(default)]
    pub agent_slug: Option<String>,
    /// Stripe session for payment top-ups.
    #[serde(default)]
    pub stripe_session_id: Option<String>,
    /// Timestamp (RFC 3339).
    pub created_at: String,
}

/// Transaction history page.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTransactionsResponse {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionSummary>,
    /// Whether more pages exist.
    pub has_more: bool,
}

/// Top-up initiation result.
#[derive(Debug, Clone, Deserialize)]
pub struct TopUpResponse {
    /// Stripe Checkout URL to redirect the user to.
    pub checkout_url: String,
    /// Session ID for later verification.
    pub session_id: String,
}

/// Payment verification result.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentResponse {
    /// Whether the session's payment completed.
    pub paid: bool,
    /// Whether this call credited the wallet.
    pub credited: bool,
    /// Wallet balance after verification, in cents.
    pub wallet_balance_cents: i64,
}

/// A marketplace agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSummary {
    /// Routing slug.
    pub slug: AgentSlug,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Price per invocation in cents.
    pub price_cents: i64,
    /// Price formatted as dollars.
    pub price_formatted: String,
}

/// Agent catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ListAgentsResponse {
    /// All invocable agents.
    pub agents: Vec<AgentSummary>,
}

/// Invocation receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeReceipt {
    /// Run identifier assigned by the runner.
    pub run_id: String,
    /// The usage transaction that paid for the run.
    pub transaction_id: String,
    /// Amount charged in cents.
    pub charged_cents: i64,
    /// Wallet balance after the charge.
    pub wallet_balance_cents: i64,
}

/// Run results.
#[derive(Debug, Clone, Deserialize)]
pub struct RunResult {
    /// Run identifier.
    pub run_id: String,
    /// Run status (`queued`, `running`, `completed`, `failed`).
    pub status: String,
    /// Result rows, empty until the run completes.
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    /// Error message for failed runs.
    #[serde(default)]
    pub error: Option<String>,
}

/// Service error body, as produced by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// The error payload.
    pub error: ApiErrorBody,
}

/// Service error payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured details (e.g. balance/required for 402s).
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Request body for top-ups.
#[derive(Debug, Clone, Serialize)]
pub struct TopUpRequest {
    /// Amount in dollars.
    pub amount_usd: f64,
}

/// Request body for payment verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentRequest {
    /// The Checkout session to verify.
    pub session_id: String,
}

/// Request body for agent invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvokeRequest {
    /// Agent-specific input.
    pub input: serde_json::Value,
}
