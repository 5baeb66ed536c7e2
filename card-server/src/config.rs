//! Server configuration.
//!
//! Every option can be given on the command line or through the
//! environment, e.g. `--port 8080` or `CARD_PORT=8080`.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::validation::{validate_export_size, InputError};

/// Default port for the card server.
pub const DEFAULT_PORT: u16 = 9473;

/// Default remote store request timeout in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Default asset resolution timeout in milliseconds.
pub const DEFAULT_ASSET_TIMEOUT_MS: u64 = 10_000;

/// Command-line and environment configuration for `tech-card`.
#[derive(Debug, Clone, Parser)]
#[command(name = "tech-card")]
#[command(about = "Tech Card Builder HTTP server")]
#[command(version)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "CARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "CARD_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Public origin used in share links (e.g. <https://cards.example.com>)
    #[arg(long = "origin", env = "CARD_PUBLIC_ORIGIN")]
    pub public_origin: Option<String>,

    /// Base URL of the remote document store
    #[arg(long, env = "CARD_STORE_URL")]
    pub store_url: Option<String>,

    /// Remote store request timeout in milliseconds
    #[arg(long, env = "CARD_STORE_TIMEOUT_MS", default_value_t = DEFAULT_STORE_TIMEOUT_MS)]
    pub store_timeout_ms: u64,

    /// Directory for cards saved by the local fallback
    #[arg(long, env = "CARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory that icon paths are resolved against during export
    #[arg(long, env = "CARD_ASSET_DIR")]
    pub asset_dir: Option<PathBuf>,

    /// Default export width in pixels
    #[arg(long, env = "CARD_EXPORT_WIDTH", default_value_t = 1260)]
    pub export_width: u32,

    /// Default export height in pixels
    #[arg(long, env = "CARD_EXPORT_HEIGHT", default_value_t = 1950)]
    pub export_height: u32,

    /// Time allowed for loading the images of a card during export, in milliseconds
    #[arg(long, env = "CARD_ASSET_TIMEOUT_MS", default_value_t = DEFAULT_ASSET_TIMEOUT_MS)]
    pub asset_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            public_origin: None,
            store_url: None,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            data_dir: None,
            asset_dir: None,
            export_width: 1260,
            export_height: 1950,
            asset_timeout_ms: DEFAULT_ASSET_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    /// Check values clap cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::ExportSize`] if the default export size is
    /// out of range.
    pub fn validate(&self) -> Result<(), InputError> {
        validate_export_size(self.export_width, self.export_height)
    }

    /// Origin that share links point at.
    ///
    /// Falls back to the local listen address.
    #[must_use]
    pub fn public_origin(&self) -> String {
        match &self.public_origin {
            Some(origin) => origin.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Default export size.
    #[must_use]
    pub fn export_size(&self) -> (u32, u32) {
        (self.export_width, self.export_height)
    }

    /// Remote store request timeout.
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Asset resolution timeout.
    #[must_use]
    pub fn asset_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_timeout_ms)
    }
}
