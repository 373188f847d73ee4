//! Checkout orders and their status transitions.
//!
//! An order is the boundary object between the stock ledger and the payment
//! gateway: a snapshot of cart lines taken at checkout time, the gateway
//! session created for it, and a status driven by the webhook and the hold
//! sweeper. Orders live in process memory; the durable correctness contract
//! stays in the stock ledger.

use crate::types::{OrderId, OrderLine, OrderStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// A checkout order.
#[derive(Clone, Debug)]
pub struct Order {
    /// Order identifier.
    pub id: OrderId,
    /// Gateway checkout session identifier.
    pub session_id: String,
    /// Hosted checkout URL the customer is redirected to.
    pub checkout_url: String,
    /// Cart snapshot at checkout time.
    pub lines: Vec<OrderLine>,
    /// Current status.
    pub status: OrderStatus,
    /// When the stock holds backing this order expire.
    pub hold_expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the order reached a terminal status. `None` while pending.
    pub settled_at: Option<DateTime<Utc>>,
}

/// Outcome of a status transition request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The order moved to the requested status.
    Applied,
    /// The order was already in the requested status. Webhook re-delivery
    /// lands here and must stay a no-op.
    AlreadyApplied,
}

/// Errors from order status transitions.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order with this identifier.
    #[error("order {0} not found")]
    UnknownOrder(OrderId),
    /// The order is in a terminal status different from the requested one.
    #[error("order is already {from:?}, cannot move to {to:?}")]
    Conflict {
        /// Current terminal status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// In-process registry of checkout orders.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl OrderLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new order.
    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }

    /// Fetch an order by id.
    pub async fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    /// Move an order to `target`.
    ///
    /// Transition rules:
    /// - `PendingPayment` may move to any terminal status.
    /// - A transition to the current status is an idempotent no-op.
    /// - Any other transition out of a terminal status is a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::UnknownOrder`] or [`OrderError::Conflict`].
    pub async fn transition(
        &self,
        id: OrderId,
        target: OrderStatus,
    ) -> Result<Transition, OrderError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id).ok_or(OrderError::UnknownOrder(id))?;

        if order.status == target {
            return Ok(Transition::AlreadyApplied);
        }
        if order.status.is_terminal() {
            return Err(OrderError::Conflict {
                from: order.status,
                to: target,
            });
        }

        tracing::info!(
            order_id = %id,
            from = ?order.status,
            to = ?target,
            "Order status transition"
        );
        order.status = target;
        if target.is_terminal() {
            order.settled_at = Some(Utc::now());
        }
        Ok(Transition::Applied)
    }

    /// Drop terminal orders settled at or before `cutoff`. Orders inside the
    /// retention window stay so webhook re-deliveries keep hitting the
    /// idempotent path. Returns the number of orders dropped.
    pub async fn purge_settled(&self, cutoff: DateTime<Utc>) -> usize {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|_, order| match order.settled_at {
            Some(settled_at) => settled_at > cutoff,
            None => true,
        });
        before - orders.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Money, ProductId};

    fn sample_order(id: OrderId) -> Order {
        Order {
            id,
            session_id: "cs_test".to_string(),
            checkout_url: "https://pay.example/cs_test".to_string(),
            lines: vec![OrderLine {
                product_id: ProductId::from("p1"),
                quantity: 2,
                unit_price: Money::from_cents(1500),
            }],
            status: OrderStatus::PendingPayment,
            hold_expires_at: Utc::now(),
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    #[tokio::test]
    async fn pending_moves_to_confirmed() {
        let ledger = OrderLedger::new();
        let id = OrderId::new();
        ledger.insert(sample_order(id)).await;

        let outcome = ledger
            .transition(id, OrderStatus::PaymentConfirmed)
            .await
            .unwrap();
        assert_eq!(outcome, Transition::Applied);
        assert_eq!(
            ledger.get(id).await.unwrap().status,
            OrderStatus::PaymentConfirmed
        );
    }

    #[tokio::test]
    async fn repeated_transition_is_a_noop() {
        let ledger = OrderLedger::new();
        let id = OrderId::new();
        ledger.insert(sample_order(id)).await;

        ledger
            .transition(id, OrderStatus::PaymentConfirmed)
            .await
            .unwrap();
        let outcome = ledger
            .transition(id, OrderStatus::PaymentConfirmed)
            .await
            .unwrap();
        assert_eq!(outcome, Transition::AlreadyApplied);
    }

    #[tokio::test]
    async fn conflicting_terminal_transition_is_rejected() {
        let ledger = OrderLedger::new();
        let id = OrderId::new();
        ledger.insert(sample_order(id)).await;

        ledger.transition(id, OrderStatus::Cancelled).await.unwrap();
        let err = ledger
            .transition(id, OrderStatus::PaymentConfirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Conflict { .. }));
    }

    #[tokio::test]
    async fn purge_drops_only_settled_orders_past_retention() {
        let ledger = OrderLedger::new();
        let settled = OrderId::new();
        let pending = OrderId::new();
        ledger.insert(sample_order(settled)).await;
        ledger.insert(sample_order(pending)).await;
        ledger.transition(settled, OrderStatus::Cancelled).await.unwrap();

        // Cutoff in the past: the settled order is still inside retention.
        let purged = ledger
            .purge_settled(Utc::now() - chrono::Duration::hours(1))
            .await;
        assert_eq!(purged, 0);

        // Cutoff in the future: only the settled order goes; pending orders
        // are never purged.
        let purged = ledger
            .purge_settled(Utc::now() + chrono::Duration::hours(1))
            .await;
        assert_eq!(purged, 1);
        assert!(ledger.get(settled).await.is_none());
        assert!(ledger.get(pending).await.is_some());
    }

    #[tokio::test]
    async fn unknown_order_is_reported() {
        let ledger = OrderLedger::new();
        let err = ledger
            .transition(OrderId::new(), OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::UnknownOrder(_)));
    }
}
