//! `RocksDB` storage layer for mesh-wallet.
//!
//! This crate provides persistent storage for users and wallet transactions
//! using `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `users`: Primary user records, keyed by `user_id`
//! - `users_by_email`: Index for the webhook's email fallback lookup
//! - `transactions`: Wallet transactions, keyed by `transaction_id` (ULID)
//! - `transactions_by_user`: Index for listing transactions by user
//! - `stripe_sessions`: Credited Checkout sessions, keyed by session ID
//!
//! # Atomicity
//!
//! Every balance mutation goes through a compound operation that re-reads
//! the user, runs its checks (session dedup, sufficient funds), and commits
//! a single `WriteBatch`, all while holding the store's write lock. There
//! is no window between the `stripe_session_id` existence check and the
//! insert; a replayed session fails with [`StoreError::DuplicateSession`]
//! before any write happens.
//!
//! # Example
//!
//! ```no_run
//! use mesh_wallet_store::{RocksStore, Store};
//! use mesh_wallet_core::{User, UserId};
//!
//! let store = RocksStore::open("/tmp/mesh-wallet-db").unwrap();
//!
//! let user = User::new(UserId::generate(), "ada@example.com", None);
//! store.put_user(&user).unwrap();
//!
//! let tx = store
//!     .credit_top_up(&user.id, 2500, "cs_test_123", "Wallet top-up of $25.00")
//!     .unwrap();
//! assert_eq!(tx.balance_after_cents, 2500);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use mesh_wallet_core::{AgentSlug, TransactionId, User, UserId, WalletTransaction};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert or update a user record, maintaining the email index.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailTaken` if the normalized email already maps
    /// to a different user.
    fn put_user(&self, user: &User) -> Result<()>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Get a user by email (normalized before lookup).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Delete a user by ID, including the email index entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn delete_user(&self, user_id: &UserId) -> Result<()>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<WalletTransaction>>;

    /// List transactions for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WalletTransaction>>;

    /// Find the top-up transaction credited for a Checkout session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_top_up_by_session(&self, session_id: &str) -> Result<Option<WalletTransaction>>;

    // =========================================================================
    // Compound Operations (atomic, serialized)
    // =========================================================================

    /// Credit a completed Stripe Checkout session to the wallet.
    ///
    /// The session dedup check, balance increment, transaction insert, and
    /// session marker insert happen under the write lock in one batch.
    /// Returns the recorded transaction (including `balance_after_cents`).
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateSession` if the session was already credited.
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InvalidAmount` if `amount_cents <= 0`.
    fn credit_top_up(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        session_id: &str,
        description: &str,
    ) -> Result<WalletTransaction>;

    /// Credit the wallet without a Checkout session (admin credit).
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InvalidAmount` if `amount_cents <= 0`.
    fn credit_manual(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        description: &str,
    ) -> Result<WalletTransaction>;

    /// Debit the wallet for an agent invocation.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InsufficientFunds` if the balance is too low.
    /// - `StoreError::InvalidAmount` if `amount_cents <= 0`.
    fn debit_agent_usage(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        agent_slug: &AgentSlug,
        description: &str,
    ) -> Result<WalletTransaction>;

    /// Credit a refund back to the wallet.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::InvalidAmount` if `amount_cents <= 0`.
    fn credit_refund(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        agent_slug: Option<&AgentSlug>,
        reason: &str,
    ) -> Result<WalletTransaction>;

    /// Fold the frozen legacy credit balance into the wallet.
    ///
    /// Converts at 1 credit = 1 cent, zeroes `credits`, and records a
    /// `top_up` transaction, all in one batch. Returns `None` (and writes
    /// nothing) if the user has no legacy credits.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn migrate_legacy_credits(&self, user_id: &UserId) -> Result<Option<WalletTransaction>>;
}
