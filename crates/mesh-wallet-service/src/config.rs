//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use mesh_wallet_core::AgentCatalog;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/mesh-wallet").
    pub data_dir: String,

    /// JWT validation base URL for the identity provider.
    pub auth_base_url: String,

    /// Expected JWT audience (default: "mesh-wallet").
    pub auth_audience: String,

    /// Admin API key for privileged endpoints.
    pub admin_api_key: Option<String>,

    /// Stripe API key (optional).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook secret (optional).
    pub stripe_webhook_secret: Option<String>,

    /// Workflow runner base URL (optional).
    pub runner_base_url: Option<String>,

    /// Workflow runner API key (optional).
    pub runner_api_key: Option<String>,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Agent catalog.
    pub catalog: AgentCatalog,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load Stripe secrets from file first, then fall back to env vars
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/mesh-wallet".into()),
            auth_base_url: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "https://id.meshlabs.dev".into()),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "mesh-wallet".into()),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            stripe_api_key,
            stripe_webhook_secret,
            runner_base_url: std::env::var("RUNNER_BASE_URL").ok(),
            runner_api_key: std::env::var("RUNNER_API_KEY").ok(),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            catalog: load_catalog(),
        }
    }
}

/// Load the agent catalog, preferring a JSON file override when configured.
fn load_catalog() -> AgentCatalog {
    if let Ok(path) = std::env::var("AGENT_CATALOG_PATH") {
        match load_json_file::<AgentCatalog>(&path) {
            Ok(catalog) => {
                tracing::info!(path = %path, agents = %catalog.len(), "Loaded agent catalog from file");
                return catalog;
            }
            Err(e) => {
                tracing::error!(path = %path, error = %e, "Failed to load agent catalog, using defaults");
            }
        }
    }
    AgentCatalog::default()
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/stripe.json",
        "mesh-wallet/.secrets/stripe.json",
        "../.secrets/stripe.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_json_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load and parse a JSON file.
fn load_json_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/mesh-wallet".into(),
            auth_base_url: "https://id.meshlabs.dev".into(),
            auth_audience: "mesh-wallet".into(),
            admin_api_key: None,
            stripe_api_key: None,
            stripe_webhook_secret: None,
            runner_base_url: None,
            runner_api_key: None,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            catalog: AgentCatalog::default(),
        }
    }
}
