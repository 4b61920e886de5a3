//! Wallet transaction types for mesh-wallet.
//!
//! Every balance change creates an append-only transaction record. The kind
//! enum is exactly the three kinds the ledger knows: top-ups (Stripe
//! checkout, manual admin credit, legacy migration), agent usage debits,
//! and refunds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AgentSlug, TransactionId, UserId};

/// A wallet transaction representing a balance change.
///
/// Transactions use ULIDs for time-ordered IDs. `balance_after_cents` is a
/// snapshot taken inside the same atomic write that applied the change, so
/// the history can be audited without replaying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose wallet was affected.
    pub user_id: UserId,

    /// Amount in cents. Positive = credit, Negative = debit.
    pub amount_cents: i64,

    /// Kind of transaction.
    pub kind: TransactionKind,

    /// Human-readable description.
    pub description: String,

    /// The agent this entry relates to, for `agent_usage` debits and their
    /// compensating refunds.
    pub agent_slug: Option<AgentSlug>,

    /// Stripe Checkout session ID for `top_up` entries created from a
    /// payment. This is the idempotency key: the store refuses a second
    /// top-up carrying the same session ID.
    pub stripe_session_id: Option<String>,

    /// Wallet balance after this transaction (in cents).
    pub balance_after_cents: i64,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Create a top-up transaction from a completed Stripe Checkout session.
    #[must_use]
    pub fn top_up(
        user_id: UserId,
        amount_cents: i64,
        balance_after_cents: i64,
        stripe_session_id: impl Into<String>,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_cents,
            kind: TransactionKind::TopUp,
            description,
            agent_slug: None,
            stripe_session_id: Some(stripe_session_id.into()),
            balance_after_cents,
            created_at: Utc::now(),
        }
    }

    /// Create a manual top-up transaction (admin credit, legacy migration).
    ///
    /// Carries no session ID and therefore bypasses session dedup.
    #[must_use]
    pub fn manual_top_up(
        user_id: UserId,
        amount_cents: i64,
        balance_after_cents: i64,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_cents,
            kind: TransactionKind::TopUp,
            description,
            agent_slug: None,
            stripe_session_id: None,
            balance_after_cents,
            created_at: Utc::now(),
        }
    }

    /// Create an agent usage transaction (deduction).
    #[must_use]
    pub fn agent_usage(
        user_id: UserId,
        amount_cents: i64,
        balance_after_cents: i64,
        agent_slug: AgentSlug,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_cents: -amount_cents.abs(), // Always negative for usage
            kind: TransactionKind::AgentUsage,
            description,
            agent_slug: Some(agent_slug),
            stripe_session_id: None,
            balance_after_cents,
            created_at: Utc::now(),
        }
    }

    /// Create a refund transaction.
    #[must_use]
    pub fn refund(
        user_id: UserId,
        amount_cents: i64,
        balance_after_cents: i64,
        agent_slug: Option<AgentSlug>,
        reason: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_cents: amount_cents.abs(), // Always positive for refunds
            kind: TransactionKind::Refund,
            description: reason,
            agent_slug,
            stripe_session_id: None,
            balance_after_cents,
            created_at: Utc::now(),
        }
    }
}

/// Kind of wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Wallet credited: Stripe top-up, admin credit, or legacy migration.
    TopUp,

    /// Wallet debited for an agent invocation.
    AgentUsage,

    /// Wallet credited back: manual refund or compensating refund for a
    /// failed dispatch.
    Refund,
}

impl TransactionKind {
    /// Check if this kind adds funds (positive balance change).
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::TopUp | Self::Refund)
    }

    /// Check if this kind removes funds (negative balance change).
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::AgentUsage)
    }

    /// Wire name, as stored in API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TopUp => "top_up",
            Self::AgentUsage => "agent_usage",
            Self::Refund => "refund",
        }
    }
}
