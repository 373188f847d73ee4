//! HTTP API handlers.
//!
//! One file per concern:
//! - [`stock`]: the stock ledger surface (check, reserve, release, set,
//!   batch sync) plus product creation.
//! - [`checkout`]: checkout orchestration and the payment webhook.
//!
//! All success responses carry `success: true`; failures go through
//! [`crate::error::AppError`], which renders the shared failure envelope.

pub mod checkout;
pub mod stock;
