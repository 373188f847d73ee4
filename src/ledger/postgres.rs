//! `PostgreSQL` stock store.
//!
//! Every mutation is a single conditional `UPDATE`, so the sufficiency check
//! and the decrement commit atomically inside the database. Queries are
//! runtime-bound (`sqlx::query`), no compile-time verification, so the crate
//! builds without a live database.

use super::StockStore;
use crate::error::StockError;
use crate::types::{Money, ProductId, ProductStock, StockLevel};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

/// Postgres-backed implementation of [`StockStore`].
#[derive(Clone, Debug)]
pub struct PostgresStockStore {
    pool: PgPool,
}

impl PostgresStockStore {
    /// Connect to the database and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::Storage`] if the connection or the schema
    /// statement fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StockError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(|e| StockError::Storage(e.to_string()))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Wrap an existing pool (used by tests that manage their own schema).
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> Result<(), StockError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS product_stock (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                stock       BIGINT NOT NULL CHECK (stock >= 0),
                price_cents BIGINT NOT NULL,
                discount    INT NOT NULL DEFAULT 0
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        Ok(())
    }

    fn row_to_level(row: &PgRow) -> Result<StockLevel, StockError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StockError::Storage(e.to_string()))?;
        let name: String = row
            .try_get("name")
            .map_err(|e| StockError::Storage(e.to_string()))?;
        let stock = Self::column_to_u32(row, "stock")?;
        let price_cents: i64 = row
            .try_get("price_cents")
            .map_err(|e| StockError::Storage(e.to_string()))?;
        let discount: i32 = row
            .try_get("discount")
            .map_err(|e| StockError::Storage(e.to_string()))?;

        Ok(StockLevel {
            id: ProductId::from(id),
            name,
            stock,
            price: Money::from_cents(u64::try_from(price_cents).unwrap_or(0)),
            discount: u32::try_from(discount).unwrap_or(0),
            available: stock > 0,
        })
    }

    fn column_to_u32(row: &PgRow, column: &str) -> Result<u32, StockError> {
        let value: i64 = row
            .try_get(column)
            .map_err(|e| StockError::Storage(e.to_string()))?;
        u32::try_from(value)
            .map_err(|_| StockError::Storage(format!("column {column} out of range: {value}")))
    }
}

#[async_trait]
impl StockStore for PostgresStockStore {
    async fn insert(&self, product: ProductStock) -> Result<(), StockError> {
        let result = sqlx::query(
            r"
            INSERT INTO product_stock (id, name, stock, price_cents, discount)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(i64::from(product.stock))
        .bind(i64::try_from(product.price.cents()).unwrap_or(i64::MAX))
        .bind(i32::try_from(product.discount).unwrap_or(0))
        .execute(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StockError::Duplicate(product.id));
        }
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<StockLevel, StockError> {
        let row = sqlx::query(
            r"
            SELECT id, name, stock, price_cents, discount
            FROM product_stock
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        match row {
            Some(row) => Self::row_to_level(&row),
            None => Err(StockError::NotFound(id.clone())),
        }
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<StockLevel>, StockError> {
        let id_strings: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();

        let rows = sqlx::query(
            r"
            SELECT id, name, stock, price_cents, discount
            FROM product_stock
            WHERE id = ANY($1)
            ",
        )
        .bind(&id_strings)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        rows.iter().map(Self::row_to_level).collect()
    }

    async fn reserve(&self, id: &ProductId, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity(0));
        }

        // The sufficiency check is part of the UPDATE predicate; the database
        // serializes concurrent callers on the row lock, so exactly one of
        // two simultaneous last-unit reservations matches.
        let row = sqlx::query(
            r"
            UPDATE product_stock
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            ",
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        match row {
            Some(row) => Self::column_to_u32(&row, "stock"),
            // Unknown product and insufficient stock both fall out of the
            // predicate; the merged outcome is deliberate.
            None => Err(StockError::Unavailable(id.clone())),
        }
    }

    async fn release(&self, id: &ProductId, quantity: u32) -> Result<u32, StockError> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity(0));
        }

        // Saturate at the u32 ceiling, like the in-memory store; past it the
        // stock column would no longer read back as a u32.
        let row = sqlx::query(
            r"
            UPDATE product_stock
            SET stock = LEAST(stock + $2, 4294967295)
            WHERE id = $1
            RETURNING stock
            ",
        )
        .bind(id.as_str())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        match row {
            Some(row) => Self::column_to_u32(&row, "stock"),
            None => Err(StockError::NotFound(id.clone())),
        }
    }

    async fn set_stock(&self, id: &ProductId, stock: u32) -> Result<StockLevel, StockError> {
        let row = sqlx::query(
            r"
            UPDATE product_stock
            SET stock = $2
            WHERE id = $1
            RETURNING id, name, stock, price_cents, discount
            ",
        )
        .bind(id.as_str())
        .bind(i64::from(stock))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StockError::Storage(e.to_string()))?;

        match row {
            Some(row) => Self::row_to_level(&row),
            None => Err(StockError::NotFound(id.clone())),
        }
    }
}
