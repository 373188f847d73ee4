//! HTTP surface tests driven through the router with `tower::ServiceExt`.
//!
//! No network, no database: the in-memory ledger backs every request, which
//! keeps these tests exercising the same handler code the binary serves.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bloomstock::ledger::MemoryStockStore;
use bloomstock::payment_gateway::MockPaymentGateway;
use bloomstock::server::{build_router, AppState};
use bloomstock::types::{Money, ProductId, ProductStock};
use bloomstock::{HoldLedger, OrderLedger};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn record(id: &str, stock: u32) -> ProductStock {
    ProductStock {
        id: ProductId::from(id),
        name: format!("Book {id}"),
        stock,
        price: Money::from_cents(1299),
        discount: 0,
    }
}

fn app_with(records: impl IntoIterator<Item = ProductStock>) -> Router {
    let store = Arc::new(MemoryStockStore::with_records(records));
    let holds = Arc::new(HoldLedger::new(store.clone(), Duration::from_secs(900)));
    let orders = Arc::new(OrderLedger::new());
    build_router(AppState::new(
        store,
        holds,
        orders,
        MockPaymentGateway::shared(),
    ))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn create_product_returns_created_record() {
    let app = app_with([]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"id": "bk-001", "name": "The Secret Garden", "stock": 12, "price": 1299})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["product"]["id"], json!("bk-001"));
    assert_eq!(body["product"]["stock"], json!(12));
    assert_eq!(body["product"]["available"], json!(true));
}

#[tokio::test]
async fn create_product_generates_id_when_omitted() {
    let app = app_with([]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"name": "Rose Bouquet", "stock": 3, "price": 4500})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["product"]["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_product_conflicts() {
    let app = app_with([record("bk-001", 5)]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"id": "bk-001", "name": "Copy", "stock": 1, "price": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("CONFLICT"));
}

#[tokio::test]
async fn negative_stock_is_rejected_at_creation() {
    let app = app_with([]);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"id": "bk-002", "name": "Bad", "stock": -1, "price": 100})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Stock check
// ============================================================================

#[tokio::test]
async fn check_stock_returns_projection() {
    let app = app_with([record("bk-001", 7)]);
    let (status, body) = send(&app, Method::GET, "/api/products/bk-001/stock", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["stock"], json!(7));
    assert_eq!(body["product"]["price"], json!(1299));
}

#[tokio::test]
async fn check_stock_unknown_product_is_not_found() {
    let app = app_with([]);
    let (status, body) = send(&app, Method::GET, "/api/products/ghost/stock", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

// ============================================================================
// Reserve
// ============================================================================

#[tokio::test]
async fn reserve_decrements_stock() {
    let app = app_with([record("bk-001", 5)]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products/bk-001/stock/reserve",
        Some(json!({"quantity": 2})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["new_stock"], json!(3));

    let (_, check) = send(&app, Method::GET, "/api/products/bk-001/stock", None).await;
    assert_eq!(check["product"]["stock"], json!(3));
}

#[tokio::test]
async fn reserve_beyond_stock_is_rejected_without_partial_decrement() {
    let app = app_with([record("bk-001", 3)]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products/bk-001/stock/reserve",
        Some(json!({"quantity": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    // All-or-nothing: the failed reservation left stock untouched.
    let (_, check) = send(&app, Method::GET, "/api/products/bk-001/stock", None).await;
    assert_eq!(check["product"]["stock"], json!(3));
}

#[tokio::test]
async fn reserve_unknown_product_reads_as_unavailable() {
    // A missing product and insufficient stock are the same outcome here,
    // so probing cannot distinguish catalog contents.
    let app = app_with([]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products/ghost/stock/reserve",
        Some(json!({"quantity": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn reserve_rejects_zero_and_negative_quantities() {
    let app = app_with([record("bk-001", 5)]);
    for quantity in [0, -3] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/products/bk-001/stock/reserve",
            Some(json!({"quantity": quantity})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, check) = send(&app, Method::GET, "/api/products/bk-001/stock", None).await;
    assert_eq!(check["product"]["stock"], json!(5));
}

// ============================================================================
// Release
// ============================================================================

#[tokio::test]
async fn release_increments_stock_unconditionally() {
    let app = app_with([record("bk-001", 0)]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products/bk-001/stock/release",
        Some(json!({"quantity": 4})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_stock"], json!(4));
}

#[tokio::test]
async fn release_unknown_product_is_not_found() {
    let app = app_with([]);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products/ghost/stock/release",
        Some(json!({"quantity": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn release_rejects_zero_quantity() {
    let app = app_with([record("bk-001", 1)]);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products/bk-001/stock/release",
        Some(json!({"quantity": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Set stock
// ============================================================================

#[tokio::test]
async fn set_stock_overwrites_value() {
    let app = app_with([record("bk-001", 2)]);
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/products/bk-001/stock",
        Some(json!({"stock": 25})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["stock"], json!(25));
}

#[tokio::test]
async fn set_stock_rejects_negative_value() {
    let app = app_with([record("bk-001", 2)]);
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/products/bk-001/stock",
        Some(json!({"stock": -5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Batch sync
// ============================================================================

#[tokio::test]
async fn sync_returns_existing_products_and_omits_missing() {
    let app = app_with([record("bk-001", 5), record("fl-007", 0)]);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/stock/sync",
        Some(json!({"product_ids": ["bk-001", "ghost", "fl-007"]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);

    let ids: Vec<&str> = products.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&"bk-001"));
    assert!(ids.contains(&"fl-007"));

    let sold_out = products.iter().find(|p| p["id"] == "fl-007").unwrap();
    assert_eq!(sold_out["available"], json!(false));
}

#[tokio::test]
async fn sync_rejects_empty_id_list() {
    let app = app_with([record("bk-001", 5)]);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/stock/sync",
        Some(json!({"product_ids": []})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Probes
// ============================================================================

#[tokio::test]
async fn health_and_readiness_answer_ok() {
    let app = app_with([]);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}
