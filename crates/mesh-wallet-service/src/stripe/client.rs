//! Stripe API client implementation.

use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use super::types::{CheckoutSession, Customer, StripeErrorResponse};
use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Maximum accepted age of a webhook signature timestamp, in seconds.
///
/// Stripe signs the payload together with a Unix timestamp; rejecting old
/// timestamps bounds the replay window for a captured request.
const SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook signature timestamp outside the tolerance window.
    #[error("Webhook signature timestamp too old")]
    SignatureExpired,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `webhook_secret` - Optional webhook signing secret (`whsec_...`)
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    pub fn new(api_key: impl Into<String>, webhook_secret: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            webhook_secret,
        }
    }

    /// Create a new Stripe customer.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Our internal user ID (stored as metadata)
    /// * `email` - Optional customer email
    /// * `name` - Optional customer name
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_customer(
        &self,
        user_id: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Customer, StripeError> {
        let mut params = HashMap::new();
        params.insert("metadata[user_id]", user_id.to_string());

        if let Some(email) = email {
            params.insert("email", email.to_string());
        }
        if let Some(name) = name {
            params.insert("name", name.to_string());
        }

        let response = self
            .client
            .post(format!("{}/customers", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Create a Checkout session for a wallet top-up.
    ///
    /// The user ID travels as `client_reference_id` and the top-up amount as
    /// `metadata[wallet_amount_cents]`; the webhook reads both back.
    ///
    /// # Arguments
    ///
    /// * `customer_id` - Optional Stripe customer ID
    /// * `user_id` - Our internal user ID (`client_reference_id`)
    /// * `amount_cents` - Amount to charge and credit, in cents
    /// * `success_url` - URL to redirect on success
    /// * `cancel_url` - URL to redirect on cancel
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        customer_id: Option<&str>,
        user_id: &str,
        amount_cents: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        #[allow(clippy::cast_precision_loss)]
        let amount_dollars = amount_cents as f64 / 100.0;

        let mut params = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("client_reference_id", user_id.to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][product_data][name]",
                "Wallet top-up".to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                format!("${amount_dollars:.2} Agent Mesh wallet balance"),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                amount_cents.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[wallet_amount_cents]", amount_cents.to_string()),
        ];

        if let Some(cid) = customer_id {
            params.push(("customer", cid.to_string()));
        }

        tracing::debug!(
            user_id = %user_id,
            amount_cents = %amount_cents,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Retrieve a Checkout session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(format!(
                "{}/checkout/sessions/{}",
                Self::BASE_URL,
                session_id
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Verify a webhook signature.
    ///
    /// # Arguments
    ///
    /// * `payload` - Raw request body
    /// * `signature` - Value of the `stripe-signature` header
    ///   (format: `t=timestamp,v1=signature[,v1=signature2,...]`)
    /// * `now_unix` - Current Unix time, for the tolerance check
    ///
    /// # Errors
    ///
    /// - `StripeError::Configuration` if no webhook secret is configured or
    ///   the header is malformed.
    /// - `StripeError::SignatureExpired` if the timestamp is outside the
    ///   tolerance window.
    /// - `StripeError::InvalidSignature` if no candidate signature matches.
    pub fn verify_webhook_signature(
        &self,
        payload: &str,
        signature: &str,
        now_unix: i64,
    ) -> Result<(), StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        // Parse the signature header
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            let mut kv = part.splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(ts)) => timestamp = Some(ts),
                (Some("v1"), Some(sig)) => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| StripeError::Configuration("Missing timestamp".into()))?;

        if signatures.is_empty() {
            return Err(StripeError::InvalidSignature);
        }

        let timestamp_secs: i64 = timestamp
            .parse()
            .map_err(|_| StripeError::Configuration("Malformed timestamp".into()))?;

        if (now_unix - timestamp_secs).abs() > SIGNATURE_TOLERANCE_SECONDS {
            return Err(StripeError::SignatureExpired);
        }

        // Compute expected signature over "{timestamp}.{payload}"
        let signed_payload = format!("{timestamp}.{payload}");
        let expected = hmac_sha256_hex(secret, &signed_payload);

        // Check if any signature matches (constant-time comparison)
        let valid = signatures.iter().any(|sig| constant_time_eq(&expected, sig));

        if valid {
            Ok(())
        } else {
            Err(StripeError::InvalidSignature)
        }
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn signed_header(payload: &str, timestamp: i64) -> String {
        let signed_payload = format!("{timestamp}.{payload}");
        let sig = hmac_sha256_hex(SECRET, &signed_payload);
        format!("t={timestamp},v1={sig}")
    }

    fn client_with_secret() -> StripeClient {
        StripeClient::new("sk_test_xxx", Some(SECRET.to_string()))
    }

    #[test]
    fn valid_signature_accepted() {
        let client = client_with_secret();
        let payload = r#"{"id": "evt_1"}"#;
        let header = signed_header(payload, 1_700_000_000);

        client
            .verify_webhook_signature(payload, &header, 1_700_000_000)
            .unwrap();
    }

    #[test]
    fn tampered_payload_rejected() {
        let client = client_with_secret();
        let header = signed_header(r#"{"id": "evt_1"}"#, 1_700_000_000);

        let result =
            client.verify_webhook_signature(r#"{"id": "evt_2"}"#, &header, 1_700_000_000);
        assert!(matches!(result, Err(StripeError::InvalidSignature)));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let client = client_with_secret();
        let payload = r#"{"id": "evt_1"}"#;
        let header = signed_header(payload, 1_700_000_000);

        let result = client.verify_webhook_signature(
            payload,
            &header,
            1_700_000_000 + SIGNATURE_TOLERANCE_SECONDS + 1,
        );
        assert!(matches!(result, Err(StripeError::SignatureExpired)));
    }

    #[test]
    fn missing_timestamp_rejected() {
        let client = client_with_secret();
        let result =
            client.verify_webhook_signature("{}", "v1=deadbeef", 1_700_000_000);
        assert!(matches!(result, Err(StripeError::Configuration(_))));
    }

    #[test]
    fn second_v1_candidate_accepted() {
        let client = client_with_secret();
        let payload = r#"{"id": "evt_1"}"#;
        let timestamp = 1_700_000_000;
        let signed_payload = format!("{timestamp}.{payload}");
        let good = hmac_sha256_hex(SECRET, &signed_payload);
        let header = format!("t={timestamp},v1=badbadbad,v1={good}");

        client
            .verify_webhook_signature(payload, &header, timestamp)
            .unwrap();
    }

    #[test]
    fn no_secret_is_configuration_error() {
        let client = StripeClient::new("sk_test_xxx", None);
        let result = client.verify_webhook_signature("{}", "t=1,v1=aa", 1);
        assert!(matches!(result, Err(StripeError::Configuration(_))));
    }
}
