//! Client error types.

/// Errors returned by the mesh-wallet client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned an error response.
    #[error("API error ({status}): {code} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code from the service.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// Insufficient wallet balance (HTTP 402).
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Response body could not be parsed.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
