//! Error types for the stock service.
//!
//! Two layers:
//! - [`StockError`]: domain errors produced by the ledger and hold layer.
//! - [`AppError`]: HTTP-facing error that maps domain errors onto status
//!   codes and the shared JSON failure envelope (`success`, `message`,
//!   `code`), implementing Axum's `IntoResponse`.

use crate::types::ProductId;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Domain errors for ledger and hold operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// Quantity was zero or otherwise out of range. Rejected before any
    /// storage mutation is attempted.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The product does not exist.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The product does not exist or has insufficient stock for the request.
    ///
    /// The reserve path deliberately merges the two conditions into this
    /// single outcome.
    #[error("product {0} is unavailable or has insufficient stock")]
    Unavailable(ProductId),

    /// A product with this identifier already exists.
    #[error("product {0} already exists")]
    Duplicate(ProductId),

    /// The backing storage failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Application error type for HTTP handlers.
///
/// Wraps domain errors and renders the shared failure envelope. Modeled as a
/// status + user-facing message + machine code, with an optional source kept
/// only for logging.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code.
    status: StatusCode,
    /// Error message (user-facing).
    message: String,
    /// Error code (for client error handling).
    code: String,
    /// Internal error (for logging, not exposed to the client).
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT".to_string())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }

    /// The HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InvalidQuantity(_) | StockError::Unavailable(_) => {
                // Unavailable is a recoverable branch for the caller, not a
                // server fault: surface it as a failed request.
                Self::bad_request(err.to_string())
            }
            StockError::NotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                err.to_string(),
                "NOT_FOUND".to_string(),
            ),
            StockError::Duplicate(_) => Self::conflict(err.to_string()),
            StockError::Storage(_) => {
                Self::internal("storage unavailable").with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("an internal error occurred").with_source(err)
    }
}

/// Failure envelope (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Always `false` on the failure path.
    success: bool,
    /// Human-readable error message.
    message: String,
    /// Error code (for client error handling).
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            success: false,
            message: self.message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}
