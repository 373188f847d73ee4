//! Mock payment gateway for development and testing.
//!
//! The storefront delegates payment capture to a hosted checkout page; this
//! module only models the session boundary the stock service needs. In
//! production this is replaced with the real gateway integration.

use crate::types::{Money, OrderId, OrderLine};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Payment gateway result.
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// Payment gateway error.
#[derive(Debug, Clone)]
pub enum PaymentGatewayError {
    /// The gateway rejected the session request.
    Rejected {
        /// Rejection reason.
        reason: String,
    },
    /// Gateway timeout.
    Timeout,
    /// Other error.
    Other {
        /// Error message.
        message: String,
    },
}

impl std::fmt::Display for PaymentGatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected { reason } => write!(f, "Checkout session rejected: {reason}"),
            Self::Timeout => write!(f, "Gateway timeout"),
            Self::Other { message } => write!(f, "Payment error: {message}"),
        }
    }
}

impl std::error::Error for PaymentGatewayError {}

/// A hosted checkout session created by the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Gateway session identifier.
    pub session_id: String,
    /// URL of the hosted checkout page.
    pub checkout_url: String,
    /// Total amount the session charges.
    pub amount: Money,
}

/// Payment gateway trait.
///
/// Abstraction over hosted-checkout providers like Stripe Checkout.
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for an order snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects or times out.
    fn create_checkout_session(
        &self,
        order_id: OrderId,
        lines: Vec<OrderLine>,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<CheckoutSession>> + Send>>;
}

/// Mock payment gateway (always succeeds for development).
#[derive(Clone, Debug)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    /// Creates a new mock payment gateway.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing.
    #[must_use]
    pub fn shared() -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new())
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_checkout_session(
        &self,
        order_id: OrderId,
        lines: Vec<OrderLine>,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<CheckoutSession>> + Send>> {
        Box::pin(async move {
            let amount = lines
                .iter()
                .fold(Money::from_cents(0), |acc, line| {
                    Money::from_cents(
                        acc.cents()
                            .saturating_add(line.unit_price.times(line.quantity).cents()),
                    )
                });

            let session_id = format!("mock_cs_{}", uuid::Uuid::new_v4());
            let checkout_url = format!("https://checkout.example.com/pay/{session_id}");

            tracing::info!(
                order_id = %order_id,
                session_id = %session_id,
                amount_cents = amount.cents(),
                line_count = lines.len(),
                "Mock checkout session created"
            );

            Ok(CheckoutSession {
                session_id,
                checkout_url,
                amount,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    #[tokio::test]
    async fn mock_session_totals_the_snapshot() {
        let gateway = MockPaymentGateway::new();
        let lines = vec![
            OrderLine {
                product_id: ProductId::from("bk-001"),
                quantity: 2,
                unit_price: Money::from_cents(1500),
            },
            OrderLine {
                product_id: ProductId::from("fl-007"),
                quantity: 1,
                unit_price: Money::from_cents(899),
            },
        ];

        let session = gateway
            .create_checkout_session(OrderId::new(), lines)
            .await
            .unwrap();

        assert_eq!(session.amount, Money::from_cents(3899));
        assert!(session.session_id.starts_with("mock_cs_"));
        assert!(session.checkout_url.contains(&session.session_id));
    }
}
