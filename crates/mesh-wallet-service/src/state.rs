//! Application state.

use std::sync::Arc;

use mesh_wallet_store::RocksStore;

use crate::config::ServiceConfig;
use crate::runner::RunnerClient;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Workflow runner client for agent dispatch (optional).
    pub runner: Option<Arc<RunnerClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        // Create Stripe client if configured
        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(
                key.clone(),
                config.stripe_webhook_secret.clone(),
            ))
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - top-ups will not be available");
        }

        // Create runner client if configured
        let runner = config.runner_base_url.as_ref().map(|url| {
            tracing::info!(runner_url = %url, "Workflow runner integration enabled");
            Arc::new(RunnerClient::new(
                url.clone(),
                config.runner_api_key.clone(),
            ))
        });

        if runner.is_none() {
            tracing::warn!("Runner not configured - agent invocations will not be dispatched");
        }

        Self {
            store,
            config,
            stripe,
            runner,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }

    /// Check if the workflow runner is configured.
    #[must_use]
    pub fn has_runner(&self) -> bool {
        self.runner.is_some()
    }
}
