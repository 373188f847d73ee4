//! Batch stock reads for the sync loop.

use crate::types::{ProductId, StockLevel};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors from a batch stock fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure.
    #[error("stock sync request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("stock sync rejected with status {0}")]
    UnexpectedStatus(u16),
    /// The response body did not match the sync contract.
    #[error("stock sync response malformed: {0}")]
    Malformed(String),
}

/// The batch stock read the sync loop depends on.
///
/// A trait so tests (and embedded deployments) can substitute an in-process
/// source for the HTTP round trip.
#[async_trait]
pub trait StockFetcher: Send + Sync {
    /// Fetch current levels for a batch of products. Missing identifiers are
    /// omitted from the result, mirroring the server's batch read.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport or contract failures.
    async fn fetch_levels(&self, ids: &[ProductId]) -> Result<Vec<StockLevel>, FetchError>;
}

/// Wire shape of the service's batch sync response.
#[derive(Debug, Deserialize)]
struct SyncResponseBody {
    #[allow(dead_code)]
    success: bool,
    products: Vec<StockLevel>,
}

/// [`StockFetcher`] that calls the service's `/api/stock/sync` endpoint.
#[derive(Clone, Debug)]
pub struct HttpStockFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStockFetcher {
    /// Creates a fetcher against `base_url` (e.g. `http://localhost:8080`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StockFetcher for HttpStockFetcher {
    async fn fetch_levels(&self, ids: &[ProductId]) -> Result<Vec<StockLevel>, FetchError> {
        let url = format!("{}/api/stock/sync", self.base_url.trim_end_matches('/'));
        let product_ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();

        let response = self
            .client
            .post(&url)
            .json(&json!({ "product_ids": product_ids }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus(status.as_u16()));
        }

        let body: SyncResponseBody = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;
        Ok(body.products)
    }
}
