//! HTTP document store client.
//!
//! Documents live at `{base}/{collection}/{id}`: `PUT` writes a JSON body,
//! `GET` reads it back and a `404` means the document does not exist.

use std::time::Duration;

use async_trait::async_trait;
use card_core::{DocumentStore, StoreError};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Errors raised while configuring the client.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// The base URL provided by configuration is invalid.
    #[error("invalid document store URL: {0}")]
    InvalidUrl(String),
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// [`DocumentStore`] backed by a REST document service.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    http: Client,
    base: Url,
}

impl HttpDocumentStore {
    /// Create a client for the store at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteStoreError::InvalidUrl`] if the URL is malformed or
    /// not http(s), and [`RemoteStoreError::Http`] if the client fails to build.
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, RemoteStoreError> {
        let base = Url::parse(base_url.as_ref())
            .map_err(|e| RemoteStoreError::InvalidUrl(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(RemoteStoreError::InvalidUrl(format!(
                "{base} is not an http(s) base URL"
            )));
        }

        let http = Client::builder()
            .user_agent(concat!("tech-card/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base })
    }

    /// Base URL of the store.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of one document. Segments are percent-encoded.
    fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Unavailable(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .push(collection)
            .push(id);
        Ok(url)
    }
}

/// Map a non-success status: server faults are transient, the rest are refusals.
fn status_error(operation: &str, status: StatusCode) -> StoreError {
    let message = format!("{operation} returned {status}");
    if status.is_server_error() {
        StoreError::Unavailable(message)
    } else {
        StoreError::Rejected(message)
    }
}

fn transport_error(operation: &str, e: &reqwest::Error) -> StoreError {
    StoreError::Unavailable(format!("{operation} failed: {e}"))
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<(), StoreError> {
        let url = self.document_url(collection, id)?;
        let operation = format!("PUT {collection}/{id}");

        let response = self
            .http
            .put(url)
            .json(document)
            .send()
            .await
            .map_err(|e| transport_error(&operation, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(&operation, status));
        }
        tracing::debug!(%collection, %id, "Document stored remotely");
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let url = self.document_url(collection, id)?;
        let operation = format!("GET {collection}/{id}");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(&operation, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(&operation, status));
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Serialization(format!("{operation}: {e}")))?;
        Ok(Some(value))
    }
}
