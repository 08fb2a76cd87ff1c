//! Test server harness for E2E testing
//!
//! Provides `TestStoreServer` for spawning real gateway instances in tests.

use crate::token_builders::TEST_TOKEN_SECRET;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use store_service::config::Config;
use store_service::observability::metrics::init_metrics_recorder;
use store_service::repositories::MemoryStore;
use store_service::routes::{self, AppState};
use store_service::services::{MockPaymentProvider, PaymentProvider};
use tokio::task::JoinHandle;

/// Process-wide metrics handle. The global recorder can only be installed
/// once, so every server in a test binary shares it.
fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the music store gateway in E2E tests.
///
/// The server runs on the in-memory store and signs tokens with
/// [`TEST_TOKEN_SECRET`].
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<()> {
///     let server = TestStoreServer::spawn(Arc::new(MemoryStore::new())).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestStoreServer {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestStoreServer {
    /// Spawn a server backed by `store` with a succeeding mock payment
    /// provider.
    pub async fn spawn(store: Arc<MemoryStore>) -> Result<Self, anyhow::Error> {
        Self::spawn_with(store, Arc::new(MockPaymentProvider::succeeding())).await
    }

    /// Spawn a server backed by `store` and the given payment provider.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(
        store: Arc<MemoryStore>,
        payments: Arc<dyn PaymentProvider>,
    ) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("DATABASE_URL".to_string(), "memory:".to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "ACCESS_TOKEN_SECRET".to_string(),
                TEST_TOKEN_SECRET.to_string(),
            ),
            (
                "PAYMENT_SECRET_KEY".to_string(),
                "sk_test_harness".to_string(),
            ),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let state = Arc::new(AppState {
            store: store.clone(),
            config: config.clone(),
            payments,
        });

        // Build routes using the gateway's real route builder
        let app = routes::build_routes(state, metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the store backing the server, for seeding and inspection.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestStoreServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
