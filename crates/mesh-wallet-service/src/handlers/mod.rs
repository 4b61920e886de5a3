//! API handlers.

// Allow precision loss in handlers - amounts displayed are well within f64 precision
#![allow(clippy::cast_precision_loss)]

pub mod admin;
pub mod agents;
pub mod health;
pub mod users;
pub mod wallet;
pub mod webhooks;

/// Format a cent amount as dollars for display fields.
#[must_use]
pub fn format_cents(amount_cents: i64) -> String {
    format!("${:.2}", amount_cents as f64 / 100.0)
}
