//! Domain types for the Flowering Stories stock service.
//!
//! Value objects shared by the ledger, the HTTP surface, and the client-side
//! sync/cart layer: identifiers, money, stock records and their read
//! projection, cart lines, stock issues, holds, and orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque stable identifier for a product.
///
/// Products come from the storefront catalog; the stock service treats the
/// identifier as an opaque string key and never parses it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a `ProductId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a stock hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HoldId(Uuid);

impl HoldId {
    /// Creates a new random `HoldId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HoldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a checkout order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies the amount by a quantity, saturating on overflow.
    #[must_use]
    pub const fn times(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Stock Ledger Records
// ============================================================================

/// Persisted stock record for a product; the single source of truth for
/// quantity on hand.
///
/// `price` and `discount` are carried for display only and play no part in
/// stock logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Quantity currently sellable. Never negative by construction.
    pub stock: u32,
    /// Unit price in cents.
    pub price: Money,
    /// Discount percentage (display only).
    pub discount: u32,
}

impl ProductStock {
    /// Whether at least one unit is sellable.
    #[must_use]
    pub const fn available(&self) -> bool {
        self.stock > 0
    }
}

/// Read projection of a stock record, as returned by check and batch-sync
/// reads and consumed by the client-side sync layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Quantity currently sellable.
    pub stock: u32,
    /// Unit price in cents.
    pub price: Money,
    /// Discount percentage.
    pub discount: u32,
    /// `stock > 0`, precomputed for the wire.
    pub available: bool,
}

impl From<&ProductStock> for StockLevel {
    fn from(record: &ProductStock) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            stock: record.stock,
            price: record.price,
            discount: record.discount,
            available: record.available(),
        }
    }
}

// ============================================================================
// Cart (client-held, ephemeral)
// ============================================================================

/// A line item in a client-held cart.
///
/// `max_stock` is the last synced authoritative ceiling. It is advisory:
/// nothing stops `quantity` from exceeding it locally, enforcement happens
/// only at reservation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier.
    pub product_id: ProductId,
    /// Desired quantity, at least 1.
    pub quantity: u32,
    /// Last known authoritative stock ceiling.
    pub max_stock: u32,
    /// Denormalized display name.
    pub name: String,
    /// Denormalized unit price.
    pub price: Money,
    /// Denormalized image URL, if any.
    pub image: Option<String>,
}

/// Classification of a cart/ledger discrepancy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockIssueKind {
    /// Authoritative stock is zero.
    OutOfStock,
    /// Authoritative stock is positive but below the cart quantity.
    InsufficientStock,
}

/// A detected mismatch between a cart line and authoritative stock.
///
/// Derived on every sync, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIssue {
    /// Product identifier.
    pub product_id: ProductId,
    /// Product display name, for messaging.
    pub name: String,
    /// Issue classification.
    pub kind: StockIssueKind,
    /// Stock available at sync time.
    pub available_stock: u32,
    /// Quantity the cart holds.
    pub requested_quantity: u32,
}

// ============================================================================
// Reservation Holds
// ============================================================================

/// Lifecycle state of a reservation hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldState {
    /// Stock is decremented and waiting on payment.
    Held,
    /// Payment confirmed; the decrement is permanent.
    Committed,
    /// Hold was released; stock was returned to the ledger.
    Released,
}

/// A time-boxed stock hold placed by checkout.
///
/// Records exactly what was reserved for which order, so release always
/// returns the held quantity and expired holds can be reaped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationHold {
    /// Hold identifier.
    pub id: HoldId,
    /// Order the hold belongs to.
    pub order_id: OrderId,
    /// Product the stock was reserved from.
    pub product_id: ProductId,
    /// Units held.
    pub quantity: u32,
    /// Current lifecycle state.
    pub state: HoldState,
    /// Instant after which a `Held` hold is reaped by the sweeper.
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Orders (checkout boundary)
// ============================================================================

/// Status of a checkout order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment session created, waiting on the gateway.
    PendingPayment,
    /// Gateway confirmed payment.
    PaymentConfirmed,
    /// Payment failed or the customer cancelled.
    Cancelled,
    /// Holds expired before payment confirmation.
    Expired,
}

impl OrderStatus {
    /// Whether the status is terminal (no further transition allowed).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::PendingPayment)
    }
}

/// A snapshot line inside an order, taken at checkout time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Product identifier.
    pub product_id: ProductId,
    /// Units purchased.
    pub quantity: u32,
    /// Unit price at checkout time.
    pub unit_price: Money,
}
