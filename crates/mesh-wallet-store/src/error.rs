//! Error types for mesh-wallet storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Which kind of record was missing.
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A user with this email already exists.
    #[error("email already registered: {email}")]
    EmailTaken {
        /// The conflicting normalized email.
        email: String,
    },

    /// Insufficient wallet balance for a debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Stripe session already credited (idempotency check failed).
    #[error("duplicate session: {session_id}")]
    DuplicateSession {
        /// The session ID that was already credited.
        session_id: String,
    },

    /// Amount failed validation (zero or wrong sign for the operation).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl StoreError {
    /// Shorthand for a missing user.
    #[must_use]
    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing transaction.
    #[must_use]
    pub fn transaction_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "transaction",
            id: id.to_string(),
        }
    }
}
