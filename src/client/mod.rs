//! Client-side layer for storefront consumers.
//!
//! The server never pushes stock changes; clients keep their cart honest by
//! polling. This module bundles the three pieces a storefront needs:
//!
//! - [`cart`]: the client-held cart and the consistency monitor that
//!   classifies and resolves cart/ledger discrepancies.
//! - [`fetcher`]: the batch stock read, as a trait plus the reqwest
//!   implementation against the service's `/api/stock/sync` endpoint.
//! - [`sync`]: the coalesced polling loop tying the two together.

pub mod cart;
pub mod fetcher;
pub mod sync;

pub use cart::{AutoResolveReport, Cart, Resolution};
pub use fetcher::{FetchError, HttpStockFetcher, StockFetcher};
pub use sync::{StockSyncService, SyncHandle, SyncTrigger, SyncTriggers, SyncUpdate};
