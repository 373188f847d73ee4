//! Business metrics for the stock service.
//!
//! Exported via the `metrics` facade; the exporter is wired up by the
//! deployment, not here.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `bloomstock_reservations_total{outcome}` - Reserve operations by outcome
//! - `bloomstock_units_reserved_total` - Units removed from the ledger
//! - `bloomstock_units_released_total` - Units returned to the ledger
//! - `bloomstock_holds_total{event}` - Hold lifecycle events
//! - `bloomstock_checkouts_total{outcome}` - Checkout attempts by outcome
//! - `bloomstock_stock_syncs_total` - Batch sync reads served
//!
//! ## Gauges
//! - `bloomstock_active_holds` - Holds currently in the `Held` state

use metrics::{describe_counter, describe_gauge};

/// Initialize and register all metric descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_metrics() {
    describe_counter!(
        "bloomstock_reservations_total",
        "Reserve operations by outcome (reserved, rejected)"
    );
    describe_counter!(
        "bloomstock_units_reserved_total",
        "Total units removed from the stock ledger by reservations"
    );
    describe_counter!(
        "bloomstock_units_released_total",
        "Total units returned to the stock ledger by releases"
    );
    describe_counter!(
        "bloomstock_holds_total",
        "Hold lifecycle events (placed, committed, released, expired)"
    );
    describe_gauge!(
        "bloomstock_active_holds",
        "Holds currently awaiting payment confirmation"
    );
    describe_counter!(
        "bloomstock_checkouts_total",
        "Checkout attempts by outcome (created, unavailable, gateway_error)"
    );
    describe_counter!(
        "bloomstock_stock_syncs_total",
        "Batch stock sync reads served"
    );

    tracing::info!("Business metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a successful reservation of `quantity` units.
pub fn record_reservation(quantity: u32) {
    metrics::counter!("bloomstock_reservations_total", "outcome" => "reserved").increment(1);
    metrics::counter!("bloomstock_units_reserved_total").increment(u64::from(quantity));
}

/// Record a reservation that failed with the unavailable outcome.
pub fn record_reservation_rejected() {
    metrics::counter!("bloomstock_reservations_total", "outcome" => "rejected").increment(1);
}

/// Record a release of `quantity` units through the raw endpoint.
pub fn record_release(quantity: u32) {
    metrics::counter!("bloomstock_units_released_total").increment(u64::from(quantity));
}

/// Record a hold placed.
pub fn record_hold_placed() {
    metrics::counter!("bloomstock_holds_total", "event" => "placed").increment(1);
    metrics::gauge!("bloomstock_active_holds").increment(1.0);
}

/// Record a hold committed after payment confirmation.
pub fn record_hold_committed() {
    metrics::counter!("bloomstock_holds_total", "event" => "committed").increment(1);
    metrics::gauge!("bloomstock_active_holds").decrement(1.0);
}

/// Record a hold released back to the ledger.
pub fn record_hold_released(quantity: u32) {
    metrics::counter!("bloomstock_holds_total", "event" => "released").increment(1);
    metrics::gauge!("bloomstock_active_holds").decrement(1.0);
    metrics::counter!("bloomstock_units_released_total").increment(u64::from(quantity));
}

/// Record a hold reaped by the expiry sweeper.
pub fn record_hold_expired() {
    metrics::counter!("bloomstock_holds_total", "event" => "expired").increment(1);
}

/// Record a checkout attempt outcome.
pub fn record_checkout(outcome: &'static str) {
    metrics::counter!("bloomstock_checkouts_total", "outcome" => outcome).increment(1);
}

/// Record a served batch sync read.
pub fn record_stock_sync(batch_size: usize) {
    metrics::counter!("bloomstock_stock_syncs_total").increment(1);
    tracing::debug!(batch_size, "Recorded stock_sync metric");
}
