//! In-memory stock store for tests and development.

use super::StockStore;
use crate::error::StockError;
use crate::types::{ProductId, ProductStock, StockLevel};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory implementation of [`StockStore`].
///
/// A single mutex guards the whole map, which makes every operation
/// (including the sufficiency check inside `reserve`) atomic with respect to
/// concurrent callers. That is the same guarantee the Postgres store gets
/// from its conditional `UPDATE`.
#[derive(Debug, Default)]
pub struct MemoryStockStore {
    records: Mutex<HashMap<ProductId, ProductStock>>,
}

impl MemoryStockStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with records. Convenient for tests.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = ProductStock>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Mutex::new(map),
        }
    }
}

#[async_trait]
impl StockStore for MemoryStockStore {
    async fn insert(&self, product: ProductStock) -> Result<(), StockError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&product.id) {
            return Err(StockError::Duplicate(product.id));
        }
        records.insert(product.id.clone(), product);
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<StockLevel, StockError> {
        let records = self.records.lock().await;
        records
            .get(id)
            .map(StockLevel::from)
            .ok_or_else(|| StockError::NotFound(id.clone()))
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<StockLevel>, StockError> {
        let records = self.records.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(StockLevel::from))
            .collect())
    }

    async fn reserve(&self, id: &ProductId, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity(0));
        }
        let mut records = self.records.lock().await;
        // Lookup and sufficiency check happen under the same lock as the
        // decrement: no read-then-write window.
        let Some(record) = records.get_mut(id) else {
            return Err(StockError::Unavailable(id.clone()));
        };
        if record.stock < quantity {
            return Err(StockError::Unavailable(id.clone()));
        }
        record.stock -= quantity;
        Ok(record.stock)
    }

    async fn release(&self, id: &ProductId, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity(0));
        }
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StockError::NotFound(id.clone()))?;
        record.stock = record.stock.saturating_add(quantity);
        Ok(record.stock)
    }

    async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<StockLevel, StockError> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StockError::NotFound(id.clone()))?;
        record.stock = stock;
        Ok(StockLevel::from(&*record))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Money;

    fn seeded(stock: u32) -> MemoryStockStore {
        MemoryStockStore::with_records([ProductStock {
            id: ProductId::from("p1"),
            name: "Pressed Tulip Bookmark".to_string(),
            stock,
            price: Money::from_cents(499),
            discount: 0,
        }])
    }

    #[tokio::test]
    async fn reserve_decrements_and_returns_new_stock() {
        let store = seeded(5);
        let new_stock = store.reserve(&ProductId::from("p1"), 2).await.unwrap();
        assert_eq!(new_stock, 3);
    }

    #[tokio::test]
    async fn reserve_more_than_stock_leaves_stock_unchanged() {
        let store = seeded(3);
        let err = store.reserve(&ProductId::from("p1"), 4).await.unwrap_err();
        assert!(matches!(err, StockError::Unavailable(_)));
        assert_eq!(store.get(&ProductId::from("p1")).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn reserve_zero_quantity_is_rejected_before_storage() {
        let store = seeded(3);
        let err = store.reserve(&ProductId::from("p1"), 0).await.unwrap_err();
        assert!(matches!(err, StockError::InvalidQuantity(0)));
    }

    #[tokio::test]
    async fn reserve_unknown_product_reports_unavailable_not_not_found() {
        let store = seeded(3);
        let err = store.reserve(&ProductId::from("ghost"), 1).await.unwrap_err();
        assert!(matches!(err, StockError::Unavailable(_)));
    }

    #[tokio::test]
    async fn release_is_additive_regardless_of_history() {
        let store = seeded(3);
        let new_stock = store.release(&ProductId::from("p1"), 7).await.unwrap();
        assert_eq!(new_stock, 10);
    }

    #[tokio::test]
    async fn release_saturates_at_the_stock_ceiling() {
        let store = seeded(u32::MAX - 1);
        let new_stock = store.release(&ProductId::from("p1"), 5).await.unwrap();
        assert_eq!(new_stock, u32::MAX);
    }

    #[tokio::test]
    async fn release_unknown_product_is_not_found() {
        let store = seeded(3);
        let err = store.release(&ProductId::from("ghost"), 1).await.unwrap_err();
        assert!(matches!(err, StockError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_many_omits_missing_ids() {
        let store = seeded(3);
        let levels = store
            .get_many(&[ProductId::from("p1"), ProductId::from("ghost")])
            .await
            .unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].id, ProductId::from("p1"));
    }

    #[tokio::test]
    async fn insert_duplicate_is_rejected() {
        let store = seeded(3);
        let err = store
            .insert(ProductStock {
                id: ProductId::from("p1"),
                name: "dup".to_string(),
                stock: 1,
                price: Money::from_cents(100),
                discount: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::Duplicate(_)));
    }

    #[tokio::test]
    async fn set_stock_overwrites() {
        let store = seeded(3);
        let level = store.set_stock(&ProductId::from("p1"), 0).await.unwrap();
        assert_eq!(level.stock, 0);
        assert!(!level.available);
    }
}
