//! Mesh-Wallet client SDK.
//!
//! A thin HTTP client for the mesh-wallet service, used by other backend
//! services and the frontend BFF. Covers the wallet surface: balance,
//! transaction history, top-ups, and agent invocations.
//!
//! # Example
//!
//! ```no_run
//! use mesh_wallet_client::MeshWalletClient;
//!
//! # async fn example() -> Result<(), mesh_wallet_client::ClientError> {
//! let client = MeshWalletClient::new("http://mesh-wallet:8080", "user-jwt");
//!
//! let balance = client.get_balance().await?;
//! println!("wallet: {}", balance.wallet_balance_formatted);
//!
//! let receipt = client
//!     .invoke_agent("lead-enricher", serde_json::json!({"domain": "example.com"}))
//!     .await?;
//! println!("run: {}", receipt.run_id);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientOptions, MeshWalletClient};
pub use error::ClientError;
pub use types::{
    AgentSummary, BalanceResponse, InvokeReceipt, ListAgentsResponse, ListTransactionsResponse,
    RunResult, TopUpResponse, TransactionSummary, VerifyPaymentResponse,
};
