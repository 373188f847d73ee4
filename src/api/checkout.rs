//! Checkout orchestration endpoints.
//!
//! - POST /api/checkout - Place time-boxed holds and create a payment session
//! - POST /api/checkout/webhook - Gateway confirmation callback
//!
//! # Checkout Flow
//!
//! 1. **Hold**: every cart line is reserved through the hold ledger; a
//!    failure on any line releases the holds already placed for this order
//!    (compensation) and fails the request.
//! 2. **Session**: the gateway creates a hosted checkout session from the
//!    snapshot; a gateway failure also releases the holds.
//! 3. **Webhook**: `completed` commits the holds and confirms the order;
//!    `failed`/`cancelled` releases exactly the held quantities. Re-delivery
//!    of a terminal status is a no-op.
//!
//! Holds that never see a webhook are reaped by the expiry sweeper.

use crate::error::AppError;
use crate::metrics;
use crate::orders::{Order, OrderError, Transition};
use crate::server::state::AppState;
use crate::types::{OrderId, OrderLine, OrderStatus, ProductId};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A cart line in a checkout request.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    /// Product identifier.
    pub product_id: String,
    /// Units to purchase. Must be a positive integer.
    pub quantity: i64,
}

/// Request to start a checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Cart snapshot. Must not be empty.
    pub items: Vec<CheckoutItem>,
}

/// Response after a checkout session is created.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Always `true` on this path.
    pub success: bool,
    /// Created order identifier.
    pub order_id: Uuid,
    /// Gateway session identifier.
    pub session_id: String,
    /// Hosted checkout URL for the customer.
    pub checkout_url: String,
    /// When the stock holds expire unless payment confirms.
    pub expires_at: DateTime<Utc>,
}

/// Gateway webhook status.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    /// Payment captured.
    Completed,
    /// Payment failed at the gateway.
    Failed,
    /// The customer cancelled on the hosted page.
    Cancelled,
}

/// Gateway confirmation callback body.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    /// Order the callback is about.
    pub order_id: Uuid,
    /// Final session status.
    pub status: WebhookStatus,
}

/// Response to a webhook delivery.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Always `true` on this path.
    pub success: bool,
    /// Order identifier echoed back.
    pub order_id: Uuid,
    /// Order status after processing the callback.
    pub status: OrderStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a checkout: place holds and create a payment session.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/checkout \
///   -H "Content-Type: application/json" \
///   -d '{"items": [{"product_id": "bk-001", "quantity": 2}]}'
/// ```
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    if request.items.is_empty() {
        return Err(AppError::bad_request("items must not be empty"));
    }

    let order_id = OrderId::new();
    let mut lines = Vec::with_capacity(request.items.len());
    let mut hold_expires_at = Utc::now();

    for item in &request.items {
        let quantity = match u32::try_from(item.quantity) {
            Ok(q) if q > 0 => q,
            _ => {
                state.holds.release_order(order_id).await;
                metrics::record_checkout("invalid");
                return Err(AppError::bad_request(format!(
                    "invalid quantity: {}",
                    item.quantity
                )));
            }
        };
        let product_id = ProductId::from(item.product_id.as_str());

        // Price snapshot first; a vanished product surfaces as the same
        // unavailable outcome the reservation itself would produce.
        let level = match state.store.get(&product_id).await {
            Ok(level) => level,
            Err(_) => {
                state.holds.release_order(order_id).await;
                metrics::record_checkout("unavailable");
                return Err(AppError::bad_request(format!(
                    "product {product_id} is unavailable or has insufficient stock"
                )));
            }
        };

        match state.holds.place(order_id, product_id.clone(), quantity).await {
            Ok(hold) => {
                hold_expires_at = hold.expires_at;
                lines.push(OrderLine {
                    product_id,
                    quantity,
                    unit_price: level.price,
                });
            }
            Err(e) => {
                // Compensation: return every hold this order already placed.
                let released = state.holds.release_order(order_id).await;
                tracing::info!(
                    order_id = %order_id,
                    product_id = %product_id,
                    released_units = released,
                    "Checkout failed, holds compensated"
                );
                metrics::record_checkout("unavailable");
                return Err(e.into());
            }
        }
    }

    let session = match state
        .gateway
        .create_checkout_session(order_id, lines.clone())
        .await
    {
        Ok(session) => session,
        Err(e) => {
            let released = state.holds.release_order(order_id).await;
            tracing::warn!(
                order_id = %order_id,
                released_units = released,
                error = %e,
                "Payment session creation failed, holds released"
            );
            metrics::record_checkout("gateway_error");
            return Err(AppError::unavailable("payment gateway unavailable")
                .with_source(anyhow::Error::new(e)));
        }
    };

    state
        .orders
        .insert(Order {
            id: order_id,
            session_id: session.session_id.clone(),
            checkout_url: session.checkout_url.clone(),
            lines,
            status: OrderStatus::PendingPayment,
            hold_expires_at,
            created_at: Utc::now(),
            settled_at: None,
        })
        .await;

    metrics::record_checkout("created");
    tracing::info!(
        order_id = %order_id,
        session_id = %session.session_id,
        amount_cents = session.amount.cents(),
        "Checkout session created"
    );
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            success: true,
            order_id: *order_id.as_uuid(),
            session_id: session.session_id,
            checkout_url: session.checkout_url,
            expires_at: hold_expires_at,
        }),
    ))
}

/// Process a gateway confirmation callback.
///
/// Idempotent: re-delivery of the same terminal status returns success
/// without touching the ledger again.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/checkout/webhook \
///   -H "Content-Type: application/json" \
///   -d '{"order_id": "660e8400-e29b-41d4-a716-446655440001", "status": "completed"}'
/// ```
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, AppError> {
    let order_id = OrderId::from_uuid(request.order_id);
    let target = match request.status {
        WebhookStatus::Completed => OrderStatus::PaymentConfirmed,
        WebhookStatus::Failed | WebhookStatus::Cancelled => OrderStatus::Cancelled,
    };

    let outcome = state.orders.transition(order_id, target).await.map_err(|e| match e {
        OrderError::UnknownOrder(_) => AppError::not_found("Order", request.order_id),
        OrderError::Conflict { .. } => AppError::conflict(e.to_string()),
    })?;

    if outcome == Transition::Applied {
        match target {
            OrderStatus::PaymentConfirmed => {
                let committed = state.holds.commit_order(order_id).await;
                tracing::info!(order_id = %order_id, committed, "Payment confirmed");
            }
            _ => {
                let released = state.holds.release_order(order_id).await;
                tracing::info!(
                    order_id = %order_id,
                    released_units = released,
                    "Payment failed or cancelled, holds released"
                );
            }
        }
    }

    Ok(Json(WebhookResponse {
        success: true,
        order_id: request.order_id,
        status: target,
    }))
}
