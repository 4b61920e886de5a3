//! Stripe integration.
//!
//! A minimal client for the parts of the Stripe v1 API the wallet needs:
//! customers, Checkout sessions, and webhook signature verification.

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
pub use types::{CheckoutSession, Customer};
