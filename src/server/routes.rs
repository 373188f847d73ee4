//! Router configuration for the stock service.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{checkout, stock};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Routes:
/// - Health checks
/// - Product creation and stock ledger operations
/// - Batch stock sync
/// - Checkout orchestration and the payment webhook
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Catalog
        .route("/products", post(stock::create_product))
        // Stock ledger operations
        .route(
            "/products/:id/stock",
            get(stock::check_stock).put(stock::set_stock),
        )
        .route("/products/:id/stock/reserve", post(stock::reserve_stock))
        .route("/products/:id/stock/release", post(stock::release_stock))
        // Batch sync (read-through refresh for carts)
        .route("/stock/sync", post(stock::sync_stock))
        // Checkout orchestration
        .route("/checkout", post(checkout::create_checkout))
        .route("/checkout/webhook", post(checkout::payment_webhook));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
