//! User records for mesh-wallet.
//!
//! A user carries two balance fields: the authoritative wallet balance in
//! integer cents, and a legacy integer credit balance left over from the
//! pre-wallet billing scheme. Wallet operations only ever mutate
//! `wallet_balance_cents`; `credits` is frozen and can be folded into the
//! wallet once via the migration operation in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Value of one legacy credit point in cents.
///
/// Used by the one-shot legacy migration: `credits * LEGACY_CREDIT_VALUE_CENTS`
/// is added to the wallet and `credits` is zeroed in the same write.
pub const LEGACY_CREDIT_VALUE_CENTS: i64 = 1;

/// A marketplace user and their balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The user ID (from the identity provider).
    pub id: UserId,

    /// Email address. Unique; lowercased before index lookups.
    pub email: String,

    /// Display name, if provided at registration.
    pub name: Option<String>,

    /// Legacy integer credit point balance. Frozen; never mutated by wallet
    /// operations, only zeroed by the one-shot migration.
    pub credits: i64,

    /// Authoritative wallet balance in integer cents.
    pub wallet_balance_cents: i64,

    /// Stripe customer ID, set after the first checkout.
    pub stripe_customer_id: Option<String>,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with empty balances.
    #[must_use]
    pub fn new(id: UserId, email: impl Into<String>, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: email.into(),
            name,
            credits: 0,
            wallet_balance_cents: 0,
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the wallet covers a debit of `amount_cents`.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount_cents: i64) -> bool {
        self.wallet_balance_cents >= amount_cents
    }

    /// Value of the frozen legacy credit balance in cents.
    #[must_use]
    pub fn legacy_credits_value_cents(&self) -> i64 {
        self.credits.saturating_mul(LEGACY_CREDIT_VALUE_CENTS)
    }

    /// The email normalized for index lookups.
    #[must_use]
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Normalize an email address for the `users_by_email` index.
///
/// Lookups by email (the webhook fallback path) must match regardless of the
/// casing Stripe reports, so both sides normalize through this function.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_empty_balances() {
        let user = User::new(UserId::generate(), "ada@example.com", Some("Ada".into()));
        assert_eq!(user.wallet_balance_cents, 0);
        assert_eq!(user.credits, 0);
        assert!(user.stripe_customer_id.is_none());
    }

    #[test]
    fn sufficient_funds() {
        let mut user = User::new(UserId::generate(), "ada@example.com", None);
        user.wallet_balance_cents = 1000;

        assert!(user.has_sufficient_funds(500));
        assert!(user.has_sufficient_funds(1000));
        assert!(!user.has_sufficient_funds(1001));
    }

    #[test]
    fn legacy_credit_value() {
        let mut user = User::new(UserId::generate(), "ada@example.com", None);
        user.credits = 250;
        assert_eq!(user.legacy_credits_value_cents(), 250);
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
        let user = User::new(UserId::generate(), "Ada@Example.com", None);
        assert_eq!(user.normalized_email(), "ada@example.com");
    }
}
