//! The stock ledger: persisted quantity-on-hand per product.
//!
//! [`StockStore`] is the seam between handlers and storage. The correctness
//! contract of the whole service lives here: `reserve` must check sufficiency
//! and decrement as one atomic operation, so that two concurrent reservations
//! for the last unit produce exactly one success.
//!
//! Two implementations:
//! - [`MemoryStockStore`]: a single-mutex map, used by tests and dev mode.
//! - [`PostgresStockStore`]: a conditional `UPDATE` per operation, so the
//!   guarantee holds across processes.

mod memory;
mod postgres;

pub use memory::MemoryStockStore;
pub use postgres::PostgresStockStore;

use crate::error::StockError;
use crate::types::{ProductId, ProductStock, StockLevel};
use async_trait::async_trait;

/// Storage abstraction over the product stock ledger.
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Create a stock record. Fails with [`StockError::Duplicate`] if the
    /// identifier is already present.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Duplicate`] or [`StockError::Storage`].
    async fn insert(&self, product: ProductStock) -> Result<(), StockError>;

    /// Read the stock level for one product.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NotFound`] if the product does not exist.
    async fn get(&self, id: &ProductId) -> Result<StockLevel, StockError>;

    /// Read stock levels for a batch of products.
    ///
    /// Missing identifiers are silently omitted from the result, so a bulk
    /// refresh stays resilient to deleted products. An empty input yields an
    /// empty output; callers that consider an empty batch invalid must check
    /// before calling.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Storage`] only.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<StockLevel>, StockError>;

    /// Atomically decrement stock by `quantity`, conditioned on
    /// `stock >= quantity`. Returns the new stock value.
    ///
    /// Either the full quantity is reserved or nothing is; no partial
    /// decrement is ever observable.
    ///
    /// # Errors
    ///
    /// - [`StockError::InvalidQuantity`] if `quantity` is zero (checked
    ///   before touching storage).
    /// - [`StockError::Unavailable`] if the product does not exist *or* has
    ///   insufficient stock. The two are intentionally indistinguishable on
    ///   this path.
    async fn reserve(&self, id: &ProductId, quantity: u32) -> Result<u32, StockError>;

    /// Atomically increment stock by `quantity`, unconditionally (saturating
    /// at `u32::MAX`). Returns the new stock value.
    ///
    /// This is not the inverse of [`reserve`](StockStore::reserve) unless the
    /// caller tracks what was actually reserved; the hold ledger exists so
    /// the checkout path always releases exactly what it held.
    ///
    /// # Errors
    ///
    /// - [`StockError::InvalidQuantity`] if `quantity` is zero.
    /// - [`StockError::NotFound`] if the product does not exist.
    async fn release(&self, id: &ProductId, quantity: u32) -> Result<u32, StockError>;

    /// Overwrite the stock value directly (admin operation). Returns the
    /// updated level.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NotFound`] if the product does not exist.
    async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<StockLevel, StockError>;
}
