//! Core types and utilities for mesh-wallet.
//!
//! This crate provides the foundational types used throughout the mesh-wallet
//! platform:
//!
//! - **Identifiers**: `UserId`, `TransactionId`, `AgentSlug`
//! - **Users**: `User` with the wallet balance and the legacy credit balance
//! - **Transactions**: `WalletTransaction`, `TransactionKind`
//! - **Agents**: `AgentListing`, `AgentCatalog`
//!
//! # Money
//!
//! All wallet amounts are stored as `i64` integer cents. A user buying a $25
//! top-up gets `2500` cents of wallet balance; an agent priced at $1.50 costs
//! `150` cents per invocation. Dollars appear only at the formatting edge.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod agent;
pub mod ids;
pub mod transaction;
pub mod user;

pub use agent::{AgentCatalog, AgentListing};
pub use ids::{AgentSlug, IdError, TransactionId, UserId};
pub use transaction::{TransactionKind, WalletTransaction};
pub use user::{User, LEGACY_CREDIT_VALUE_CENTS};
