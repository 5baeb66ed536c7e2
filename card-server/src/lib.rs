//! # Tech Card Server Library
//!
//! Router, handlers and shared state for the `tech-card` binary.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use card_core::{CardRepository, DocumentStore, FallbackStore};
use card_renderer::{AssetResolver, CardExporter, ExportConfig};

pub mod config;
pub mod error;
pub mod health;
pub mod remote_store;
pub mod routes;
pub mod validation;

pub use config::ServerConfig;
pub use error::ApiError;
pub use remote_store::{HttpDocumentStore, RemoteStoreError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Remote-first card persistence.
    pub repository: CardRepository,
    /// Card exporter. Exports are serialized inside it.
    pub exporter: Arc<CardExporter>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the state from its parts.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        remote: Arc<dyn DocumentStore>,
        fallback: FallbackStore,
        resolver: Arc<dyn AssetResolver>,
    ) -> Self {
        let export_config = ExportConfig {
            asset_timeout: config.asset_timeout(),
            ..ExportConfig::default()
        };
        Self {
            repository: CardRepository::new(remote, fallback),
            exporter: Arc::new(CardExporter::new(export_config, resolver)),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
///
/// Tracing, request id and CORS layers are added by the binary.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/crop", post(routes::crop_photo))
        .route("/api/cards", post(routes::save_card))
        .route("/api/cards/validate", post(routes::validate_card_step))
        .route("/api/cards/export", post(routes::export_card))
        .route("/api/cards/{id}", get(routes::get_card))
        .route("/api/cards/{id}/share", get(routes::share_card))
        .layer(DefaultBodyLimit::max(validation::MAX_BODY_BYTES))
        .with_state(state)
}
