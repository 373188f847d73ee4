//! Bloomstock - stock reservation service for a small storefront.
//!
//! The heart of the system is a stock ledger with one hard invariant: a
//! product's stock never goes below zero, no matter how many buyers race for
//! the last unit. Everything else is built around that ledger:
//!
//! - **Reservation**: atomic compare-and-decrement; on the last unit exactly
//!   one concurrent reservation succeeds.
//! - **Release**: unconditional increment, so compensation paths can never
//!   themselves fail a business rule.
//! - **Holds**: checkout places time-boxed holds; a payment webhook commits
//!   or releases them, and a background sweeper reaps the ones the gateway
//!   never confirms.
//! - **Sync**: clients poll a batch read and reconcile their carts through
//!   the bundled consistency monitor and coalesced sync loop.
//!
//! # Architecture
//!
//! ```text
//!  storefront client                      stock service
//! ┌─────────────────┐                  ┌──────────────────────┐
//! │ Cart            │  POST /api/...   │ axum handlers        │
//! │ StockSyncService├─────────────────▶│   │                  │
//! │ HttpStockFetcher│                  │   ▼                  │
//! └─────────────────┘                  │ HoldLedger ── sweeper│
//!                                      │   │                  │
//!                                      │   ▼                  │
//!                                      │ StockStore           │
//!                                      │  (memory | postgres) │
//!                                      └──────────────────────┘
//! ```
//!
//! The [`ledger::StockStore`] trait is the seam: the in-memory store backs
//! tests and development, the Postgres store backs production. Both give the
//! same atomicity guarantee.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod holds;
pub mod ledger;
pub mod metrics;
pub mod orders;
pub mod payment_gateway;
pub mod server;
pub mod types;

pub use config::Config;
pub use error::{AppError, StockError};
pub use holds::HoldLedger;
pub use ledger::{MemoryStockStore, PostgresStockStore, StockStore};
pub use orders::OrderLedger;
pub use server::{build_router, AppState};
