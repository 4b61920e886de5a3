//! Mesh-Wallet HTTP API Service.
//!
//! This crate provides the HTTP API for the mesh-wallet service, including:
//!
//! - User registration and lookup
//! - Wallet balance, transaction history, and Stripe top-ups
//! - Idempotent payment crediting (webhook and client-driven verification)
//! - Agent catalog, invocation billing, and run result retrieval
//! - Admin crediting, refunds, and legacy credit migration
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **JWT bearer tokens** - For end-user requests (dashboard, etc.)
//! 2. **Admin API key** - For privileged operations via `x-admin-key`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Webhook handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod runner;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use runner::{RunnerClient, RunnerError};
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
