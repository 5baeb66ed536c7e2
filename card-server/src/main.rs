//! # Tech Card Server
//!
//! HTTP server for the Tech Card Builder. Binds to localhost unless
//! `--bind` says otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use card_core::{DocumentStore, FallbackStore, MemoryDocumentStore};
use card_renderer::{AssetResolver, DirAssetResolver, InlineAssetResolver};
use card_server::{router, AppState, HttpDocumentStore, ServerConfig};

/// Build a CORS layer that only allows localhost origins plus the public origin.
fn build_cors_layer(port: u16, public_origin: &str) -> CorsLayer {
    let allowed = [
        format!("http://localhost:{port}"),
        format!("http://127.0.0.1:{port}"),
        // Common development ports for dev servers
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(), // Vite
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        public_origin.to_string(),
    ];

    let origins: Vec<HeaderValue> = allowed.iter().filter_map(|o| o.parse().ok()).collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,card_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,card_server=debug,card_renderer=debug,tower_http=debug")
    });

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::parse();
    config.validate()?;

    let remote: Arc<dyn DocumentStore> = match &config.store_url {
        Some(url) => {
            let store = HttpDocumentStore::new(url, config.store_timeout())?;
            tracing::info!("Saving cards to {}", store.base_url());
            Arc::new(store)
        }
        None => {
            tracing::warn!("No CARD_STORE_URL set, cards are kept in memory for this run");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let fallback = match &config.data_dir {
        Some(dir) => {
            tracing::info!("Local fallback store at {:?}", dir);
            FallbackStore::with_data_dir(dir)?
        }
        None => FallbackStore::in_memory(),
    };

    let resolver: Arc<dyn AssetResolver> = match &config.asset_dir {
        Some(dir) => {
            tracing::info!("Resolving card assets from {:?}", dir);
            Arc::new(DirAssetResolver::new(dir))
        }
        None => Arc::new(InlineAssetResolver),
    };

    let port = config.port;
    let addr = SocketAddr::new(config.bind, port);
    let cors = build_cors_layer(port, &config.public_origin());
    let state = AppState::new(config, remote, fallback, resolver);

    let app = router(state)
        // Request ID for tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Tech Card server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Tech Card server stopped");
    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
