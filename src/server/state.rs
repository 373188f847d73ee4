//! Application state for the stock service HTTP server.

use crate::holds::HoldLedger;
use crate::ledger::StockStore;
use crate::orders::OrderLedger;
use crate::payment_gateway::PaymentGateway;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via Arc) for each request. Handlers are stateless; the
/// only cross-request coordination is the atomic conditional update inside
/// the stock store.
#[derive(Clone)]
pub struct AppState {
    /// Stock ledger (single source of truth for quantity on hand).
    pub store: Arc<dyn StockStore>,
    /// Reservation holds for the checkout path.
    pub holds: Arc<HoldLedger>,
    /// Checkout order registry.
    pub orders: Arc<OrderLedger>,
    /// Payment gateway boundary.
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn StockStore>,
        holds: Arc<HoldLedger>,
        orders: Arc<OrderLedger>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            holds,
            orders,
            gateway,
        }
    }
}
