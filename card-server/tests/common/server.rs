//! Test server harness for integration tests.
//!
//! Spins up the real router on a random port so tests can drive it with
//! an HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;

use card_core::{DocumentStore, FallbackStore, MemoryDocumentStore};
use card_renderer::{AssetResolver, InlineAssetResolver};
use card_server::{router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with an in-memory remote store.
    pub async fn start() -> Self {
        Self::start_with(
            ServerConfig::default(),
            Arc::new(MemoryDocumentStore::new()),
            FallbackStore::in_memory(),
            Arc::new(InlineAssetResolver),
        )
        .await
    }

    /// Start a server with the given parts.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start_with(
        mut config: ServerConfig,
        remote: Arc<dyn DocumentStore>,
        fallback: FallbackStore,
        resolver: Arc<dyn AssetResolver>,
    ) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        config.port = port;

        let state = AppState::new(config, remote, fallback, resolver);
        let app = router(state.clone());

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        // Spawn the server
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Shared state (for test assertions).
    #[allow(dead_code)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
