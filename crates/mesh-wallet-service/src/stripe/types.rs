//! Stripe API types.

use serde::Deserialize;

/// Stripe customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Stripe customer ID.
    pub id: String,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Metadata attached to the customer.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// Stripe Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Checkout URL to redirect the user to.
    #[serde(default)]
    pub url: Option<String>,
    /// Payment status (`paid`, `unpaid`, `no_payment_required`).
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// Total amount in cents.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Client reference ID (our `user_id`).
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Session status.
    #[serde(default)]
    pub status: Option<String>,
    /// Payment intent ID.
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Customer details captured at checkout.
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    /// Metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl CheckoutSession {
    /// Whether the session's payment has completed.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    /// The top-up amount in cents: the `wallet_amount_cents` metadata entry
    /// when present, falling back to `amount_total`.
    #[must_use]
    pub fn wallet_amount_cents(&self) -> Option<i64> {
        self.metadata
            .get("wallet_amount_cents")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<i64>().ok())
            .or(self.amount_total)
    }
}

/// Customer details captured at checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    /// Email entered at checkout.
    #[serde(default)]
    pub email: Option<String>,
    /// Name entered at checkout.
    #[serde(default)]
    pub name: Option<String>,
}

/// Stripe error response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// The error body.
    pub error: StripeErrorBody,
}

/// Stripe error body.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    /// Error type (e.g. `invalid_request_error`).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_paid_check() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{"id": "cs_test_1", "payment_status": "paid"}"#,
        )
        .unwrap();
        assert!(session.is_paid());

        let unpaid: CheckoutSession = serde_json::from_str(
            r#"{"id": "cs_test_2", "payment_status": "unpaid"}"#,
        )
        .unwrap();
        assert!(!unpaid.is_paid());
    }

    #[test]
    fn wallet_amount_prefers_metadata() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{
                "id": "cs_test_1",
                "amount_total": 2600,
                "metadata": {"wallet_amount_cents": "2500"}
            }"#,
        )
        .unwrap();
        assert_eq!(session.wallet_amount_cents(), Some(2500));
    }

    #[test]
    fn wallet_amount_falls_back_to_total() {
        let session: CheckoutSession =
            serde_json::from_str(r#"{"id": "cs_test_1", "amount_total": 2600}"#).unwrap();
        assert_eq!(session.wallet_amount_cents(), Some(2600));
    }
}
