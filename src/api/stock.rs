//! Stock ledger API endpoints.
//!
//! - POST /api/products - Create a product stock record
//! - GET /api/products/:id/stock - Check current stock for a product
//! - POST /api/products/:id/stock/reserve - Atomically reserve stock
//! - POST /api/products/:id/stock/release - Atomically release stock
//! - PUT /api/products/:id/stock - Set stock directly (admin)
//! - POST /api/stock/sync - Batch stock read for cart refresh

use crate::error::AppError;
use crate::metrics;
use crate::server::state::AppState;
use crate::types::{Money, ProductId, ProductStock, StockLevel};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a product stock record.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Product identifier. Generated if omitted.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Initial stock.
    pub stock: i64,
    /// Unit price in cents.
    pub price: i64,
    /// Discount percentage (display only).
    #[serde(default)]
    pub discount: i64,
}

/// Response carrying a single product stock projection.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Always `true` on this path.
    pub success: bool,
    /// The product's stock projection.
    pub product: StockLevel,
}

/// Request body for reserve and release.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    /// Units to reserve or release. Must be a positive integer.
    pub quantity: i64,
}

/// Response after a reserve or release mutation.
#[derive(Debug, Serialize)]
pub struct StockMutationResponse {
    /// Always `true` on this path.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: String,
    /// Stock value after the mutation.
    pub new_stock: u32,
}

/// Request to overwrite stock directly.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    /// New stock value. Must not be negative.
    pub stock: i64,
}

/// Request for a batch stock read.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    /// Product identifiers to refresh. Must not be empty.
    pub product_ids: Vec<String>,
}

/// Response for a batch stock read.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    /// Always `true` on this path.
    pub success: bool,
    /// Stock projections for the identifiers that exist. Missing
    /// identifiers are omitted, not errored.
    pub products: Vec<StockLevel>,
}

/// Parse a wire quantity into a positive `u32`, rejecting zero and negatives
/// before any storage touch.
fn positive_quantity(quantity: i64) -> Result<u32, AppError> {
    if quantity <= 0 {
        return Err(AppError::bad_request(format!(
            "invalid quantity: {quantity}"
        )));
    }
    u32::try_from(quantity)
        .map_err(|_| AppError::bad_request(format!("invalid quantity: {quantity}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a product stock record.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/products \
///   -H "Content-Type: application/json" \
///   -d '{"id": "bk-001", "name": "The Secret Garden", "stock": 12, "price": 1299}'
/// ```
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let stock = u32::try_from(request.stock)
        .map_err(|_| AppError::bad_request("stock must not be negative"))?;
    let price = u64::try_from(request.price)
        .map_err(|_| AppError::bad_request("price must not be negative"))?;
    let discount = u32::try_from(request.discount)
        .map_err(|_| AppError::bad_request("discount must not be negative"))?;

    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .map_or_else(|| ProductId::new(uuid::Uuid::new_v4().to_string()), ProductId::from);

    let record = ProductStock {
        id: id.clone(),
        name: request.name,
        stock,
        price: Money::from_cents(price),
        discount,
    };
    state.store.insert(record.clone()).await?;

    tracing::info!(product_id = %id, stock, "Product stock record created");
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            product: StockLevel::from(&record),
        }),
    ))
}

/// Check current stock for a product.
///
/// Purely a projection read; no side effects.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/api/products/bk-001/stock
/// ```
///
/// Response:
/// ```json
/// {
///   "success": true,
///   "product": {
///     "id": "bk-001",
///     "name": "The Secret Garden",
///     "stock": 12,
///     "price": 1299,
///     "discount": 0,
///     "available": true
///   }
/// }
/// ```
pub async fn check_stock(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state.store.get(&ProductId::from(id)).await?;
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Atomically reserve stock for a product.
///
/// The sufficiency check and the decrement are one atomic storage operation;
/// under concurrent requests for the last unit exactly one caller succeeds.
/// A missing product and insufficient stock are reported as the same
/// unavailable outcome on this path.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/products/bk-001/stock/reserve \
///   -H "Content-Type: application/json" \
///   -d '{"quantity": 2}'
/// ```
///
/// Response:
/// ```json
/// {"success": true, "message": "Reserved 2 units", "new_stock": 10}
/// ```
pub async fn reserve_stock(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<StockMutationResponse>, AppError> {
    let quantity = positive_quantity(request.quantity)?;
    let product_id = ProductId::from(id);

    let new_stock = state
        .store
        .reserve(&product_id, quantity)
        .await
        .inspect_err(|_| metrics::record_reservation_rejected())?;

    metrics::record_reservation(quantity);
    tracing::info!(product_id = %product_id, quantity, new_stock, "Stock reserved");
    Ok(Json(StockMutationResponse {
        success: true,
        message: format!("Reserved {quantity} units"),
        new_stock,
    }))
}

/// Atomically release stock back to a product.
///
/// Unconditional increment; the endpoint performs no cross-check against a
/// reservation ledger, so callers are responsible for quantity correctness.
/// Checkout-driven releases go through the hold ledger instead.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/products/bk-001/stock/release \
///   -H "Content-Type: application/json" \
///   -d '{"quantity": 2}'
/// ```
pub async fn release_stock(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<QuantityRequest>,
) -> Result<Json<StockMutationResponse>, AppError> {
    let quantity = positive_quantity(request.quantity)?;
    let product_id = ProductId::from(id);

    let new_stock = state.store.release(&product_id, quantity).await?;

    metrics::record_release(quantity);
    tracing::info!(product_id = %product_id, quantity, new_stock, "Stock released");
    Ok(Json(StockMutationResponse {
        success: true,
        message: format!("Released {quantity} units"),
        new_stock,
    }))
}

/// Set stock directly for a product (admin operation).
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:8080/api/products/bk-001/stock \
///   -H "Content-Type: application/json" \
///   -d '{"stock": 25}'
/// ```
pub async fn set_stock(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SetStockRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    let stock = u32::try_from(request.stock)
        .map_err(|_| AppError::bad_request("stock must not be negative"))?;
    let product_id = ProductId::from(id);

    let product = state.store.set_stock(&product_id, stock).await?;

    tracing::info!(product_id = %product_id, stock, "Stock set directly");
    Ok(Json(ProductResponse {
        success: true,
        product,
    }))
}

/// Batch stock read for cart refresh.
///
/// Returns the subset of requested products that exist; missing identifiers
/// are silently omitted so a bulk refresh never fails on a deleted product.
/// An empty identifier list is a validation error.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/stock/sync \
///   -H "Content-Type: application/json" \
///   -d '{"product_ids": ["bk-001", "fl-007"]}'
/// ```
pub async fn sync_stock(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    if request.product_ids.is_empty() {
        return Err(AppError::bad_request("product_ids must not be empty"));
    }

    let ids: Vec<ProductId> = request.product_ids.into_iter().map(ProductId::from).collect();
    let products = state.store.get_many(&ids).await?;

    metrics::record_stock_sync(products.len());
    Ok(Json(SyncResponse {
        success: true,
        products,
    }))
}
