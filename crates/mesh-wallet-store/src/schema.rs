//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Index: normalized email → `user_id` (16 bytes).
    pub const USERS_BY_EMAIL: &str = "users_by_email";

    /// Wallet transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Stripe Checkout sessions already credited, keyed by session ID.
    /// Value is the crediting `transaction_id` (16 bytes). This column
    /// family is the uniqueness constraint on `stripe_session_id`.
    pub const STRIPE_SESSIONS: &str = "stripe_sessions";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::USERS_BY_EMAIL,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::STRIPE_SESSIONS,
    ]
}
