//! Time-boxed stock holds for the checkout path.
//!
//! The raw release endpoint is quantity-parameterized and trusts its caller.
//! Checkout does not: every reservation it makes is recorded here as a
//! [`ReservationHold`], so releasing an order returns exactly the quantities
//! that were held, and holds that never see a payment confirmation are reaped
//! by the background sweeper once they expire.
//!
//! Hold lifecycle: `Held` → `Committed` (payment confirmed) or `Released`
//! (failure, cancellation, or expiry). Transitions out of `Held` happen under
//! the ledger's write lock, so a hold is committed or released exactly once
//! even if the webhook and the sweeper race.

use crate::error::StockError;
use crate::ledger::StockStore;
use crate::metrics;
use crate::orders::{OrderError, OrderLedger, Transition};
use crate::types::{HoldId, HoldState, OrderId, OrderStatus, ProductId, ReservationHold};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// In-process ledger of reservation holds.
pub struct HoldLedger {
    store: Arc<dyn StockStore>,
    holds: RwLock<HashMap<HoldId, ReservationHold>>,
    ttl: ChronoDuration,
}

impl HoldLedger {
    /// Creates a ledger over `store` with the given hold time-to-live.
    #[must_use]
    pub fn new(store: Arc<dyn StockStore>, ttl: Duration) -> Self {
        Self {
            store,
            holds: RwLock::new(HashMap::new()),
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::minutes(15)),
        }
    }

    /// Reserve `quantity` units and record a hold for `order_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`StockStore::reserve`] errors; on error no hold is
    /// recorded and stock is untouched.
    pub async fn place(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ReservationHold, StockError> {
        self.store.reserve(&product_id, quantity).await?;

        let hold = ReservationHold {
            id: HoldId::new(),
            order_id,
            product_id,
            quantity,
            state: HoldState::Held,
            expires_at: Utc::now() + self.ttl,
        };
        self.holds.write().await.insert(hold.id, hold.clone());
        metrics::record_hold_placed();

        tracing::debug!(
            hold_id = %hold.id,
            order_id = %order_id,
            product_id = %hold.product_id,
            quantity,
            expires_at = %hold.expires_at,
            "Stock hold placed"
        );
        Ok(hold)
    }

    /// All holds recorded for an order, in no particular order.
    pub async fn holds_for_order(&self, order_id: OrderId) -> Vec<ReservationHold> {
        self.holds
            .read()
            .await
            .values()
            .filter(|h| h.order_id == order_id)
            .cloned()
            .collect()
    }

    /// Commit every `Held` hold of an order. The stock stays decremented.
    ///
    /// Returns the number of holds committed.
    pub async fn commit_order(&self, order_id: OrderId) -> usize {
        let mut holds = self.holds.write().await;
        let mut committed = 0;
        for hold in holds.values_mut() {
            if hold.order_id == order_id && hold.state == HoldState::Held {
                hold.state = HoldState::Committed;
                committed += 1;
                metrics::record_hold_committed();
            }
        }
        tracing::debug!(order_id = %order_id, committed, "Stock holds committed");
        committed
    }

    /// Release every `Held` hold of an order, returning each held quantity
    /// to the stock ledger. Returns the total units released.
    ///
    /// Holds are flipped to `Released` before the ledger increments run, so
    /// a concurrent sweep or webhook cannot release the same hold twice. A
    /// product deleted in the meantime is logged and skipped, never an
    /// aborted release of the remaining holds.
    pub async fn release_order(&self, order_id: OrderId) -> u32 {
        let to_release = self.claim_for_release(|h| h.order_id == order_id).await;
        self.return_to_ledger(&to_release).await
    }

    /// Distinct orders that have at least one `Held` hold past its expiry.
    ///
    /// Read-only: the sweeper expires the order status first and only then
    /// claims the holds, so a payment confirmation racing the sweeper loses
    /// on the order transition and can never commit against stock that was
    /// already returned.
    pub async fn expired_order_ids(&self, now: DateTime<Utc>) -> Vec<OrderId> {
        let holds = self.holds.read().await;
        let mut order_ids: Vec<OrderId> = holds
            .values()
            .filter(|h| h.state == HoldState::Held && h.expires_at <= now)
            .map(|h| h.order_id)
            .collect();
        order_ids.sort_unstable_by_key(|id| *id.as_uuid());
        order_ids.dedup();
        order_ids
    }

    /// Release every `Held` hold of an expired order, recording the expiry.
    /// Returns the total units returned to the ledger.
    pub async fn expire_order(&self, order_id: OrderId) -> u32 {
        let expired = self.claim_for_release(|h| h.order_id == order_id).await;
        for _ in &expired {
            metrics::record_hold_expired();
        }
        self.return_to_ledger(&expired).await
    }

    /// Drop every hold that has left the `Held` state. Settled holds are
    /// never read again, so the sweeper purges them each tick to keep the
    /// ledger bounded. Returns the number of holds dropped.
    pub async fn purge_settled(&self) -> usize {
        let mut holds = self.holds.write().await;
        let before = holds.len();
        holds.retain(|_, h| h.state == HoldState::Held);
        before - holds.len()
    }

    /// Atomically flip matching `Held` holds to `Released` and hand back
    /// copies for the actual ledger increments.
    async fn claim_for_release(
        &self,
        matches: impl Fn(&ReservationHold) -> bool,
    ) -> Vec<ReservationHold> {
        let mut holds = self.holds.write().await;
        let mut claimed = Vec::new();
        for hold in holds.values_mut() {
            if hold.state == HoldState::Held && matches(hold) {
                hold.state = HoldState::Released;
                claimed.push(hold.clone());
            }
        }
        claimed
    }

    async fn return_to_ledger(&self, holds: &[ReservationHold]) -> u32 {
        let mut released = 0;
        for hold in holds {
            match self.store.release(&hold.product_id, hold.quantity).await {
                Ok(_) => {
                    released += hold.quantity;
                    metrics::record_hold_released(hold.quantity);
                }
                Err(e) => {
                    tracing::warn!(
                        hold_id = %hold.id,
                        product_id = %hold.product_id,
                        error = %e,
                        "Failed to return held stock to the ledger"
                    );
                }
            }
        }
        released
    }
}

/// Spawn the background sweeper that expires overdue orders, returns their
/// held stock, and purges settled holds and orders.
///
/// Runs until the process shuts down; one tick per `interval`. Settled
/// orders are kept for `order_retention` so webhook re-deliveries keep
/// hitting the idempotent path, then dropped.
pub fn spawn_sweeper(
    holds: Arc<HoldLedger>,
    orders: Arc<OrderLedger>,
    interval: Duration,
    order_retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "Hold sweeper started");
        let retention = ChronoDuration::from_std(order_retention)
            .unwrap_or_else(|_| ChronoDuration::hours(24));
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; harmless, there is nothing to reap.
        loop {
            ticker.tick().await;
            let now = Utc::now();
            for order_id in holds.expired_order_ids(now).await {
                // Order status is the arbiter: expire it first, and only
                // release stock once the order can no longer be confirmed.
                match orders.transition(order_id, OrderStatus::Expired).await {
                    Ok(Transition::Applied | Transition::AlreadyApplied) => {
                        let released = holds.expire_order(order_id).await;
                        tracing::info!(
                            order_id = %order_id,
                            released_units = released,
                            "Order expired, holds released"
                        );
                    }
                    Err(OrderError::UnknownOrder(_)) => {
                        // Checkout failed before registering the order; the
                        // expired holds are orphaned, reap them directly.
                        let released = holds.expire_order(order_id).await;
                        tracing::warn!(
                            order_id = %order_id,
                            released_units = released,
                            "Orphaned expired holds reaped"
                        );
                    }
                    Err(OrderError::Conflict { .. }) => {
                        // The webhook settled the order first; its commit or
                        // release owns these holds.
                        tracing::debug!(order_id = %order_id, "Order settled before expiry");
                    }
                }
            }

            let purged_holds = holds.purge_settled().await;
            let purged_orders = orders.purge_settled(now - retention).await;
            if purged_holds > 0 || purged_orders > 0 {
                tracing::debug!(purged_holds, purged_orders, "Settled entries purged");
            }
        }
    })
}
