//! Common test utilities for mesh-wallet integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use mesh_wallet_core::UserId;
use mesh_wallet_service::crypto::hmac_sha256_hex;
use mesh_wallet_service::{create_router, AppState, ServiceConfig};
use mesh_wallet_store::RocksStore;

/// Webhook secret used by harnesses with signature verification enabled.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Admin key accepted by the harness.
pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store shared with the service, for seeding state directly.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and default config.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness after letting the caller adjust the config.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            auth_audience: "mesh-wallet".into(),
            admin_api_key: Some(TEST_ADMIN_KEY.to_string()),
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Create a harness with webhook signature verification enabled.
    ///
    /// The Stripe API key makes `AppState` build the client; verification
    /// itself is local HMAC and never talks to Stripe.
    pub fn with_webhook_secret() -> Self {
        Self::with_config(|config| {
            config.stripe_api_key = Some("sk_test_xxx".into());
            config.stripe_webhook_secret = Some(TEST_WEBHOOK_SECRET.into());
        })
    }

    /// Create a harness dispatching agent runs to the given runner URL.
    pub fn with_runner(runner_url: &str) -> Self {
        let runner_url = runner_url.to_string();
        Self::with_config(move |config| {
            config.runner_base_url = Some(runner_url);
        })
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer test-token:{other_user}")
    }

    /// Seed the test user directly in the store.
    ///
    /// Used by harnesses that carry a Stripe API key, where the registration
    /// endpoint would try to create a real Stripe customer.
    pub fn seed_user(&self) {
        self.seed_user_with_email(&format!("{}@example.com", self.test_user_id));
    }

    /// Seed the test user with a specific email.
    pub fn seed_user_with_email(&self, email: &str) {
        use mesh_wallet_store::Store;

        let user = mesh_wallet_core::User::new(self.test_user_id, email, None);
        self.store.put_user(&user).expect("Failed to seed user");
    }

    /// Register the harness's test user.
    pub async fn register_user(&self) {
        self.server
            .post("/v1/users")
            .add_header("authorization", self.user_auth_header())
            .json(&serde_json::json!({
                "email": format!("{}@example.com", self.test_user_id),
                "name": "Test User"
            }))
            .await
            .assert_status_ok();
    }

    /// Credit the test user's wallet through the admin endpoint.
    pub async fn fund_wallet(&self, amount_cents: i64) {
        self.server
            .post("/v1/admin/credit")
            .add_header("x-admin-key", TEST_ADMIN_KEY)
            .json(&serde_json::json!({
                "user_id": self.test_user_id.to_string(),
                "amount_cents": amount_cents,
                "reason": "Test funding"
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a `checkout.session.completed` webhook body for the given session.
pub fn checkout_completed_event(
    user_id: &UserId,
    session_id: &str,
    amount_cents: i64,
    payment_status: &str,
) -> String {
    serde_json::json!({
        "id": format!("evt_{session_id}"),
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_status": payment_status,
                "client_reference_id": user_id.to_string(),
                "amount_total": amount_cents,
                "metadata": {
                    "wallet_amount_cents": amount_cents.to_string()
                }
            }
        }
    })
    .to_string()
}

/// Sign a webhook body the way Stripe does.
pub fn stripe_signature(body: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let signed_payload = format!("{timestamp}.{body}");
    let signature = hmac_sha256_hex(TEST_WEBHOOK_SECRET, &signed_payload);
    format!("t={timestamp},v1={signature}")
}
