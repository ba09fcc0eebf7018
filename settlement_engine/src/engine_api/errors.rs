use dealer_common::Cents;
use thiserror::Error;

use crate::{
    db_types::{OrderId, ProductId},
    traits::{OrderStoreError, PaymentProviderError},
};

/// Everything that can stop a payment signal from settling an order.
///
/// The variants fall into three groups. Use [`SettlementError::is_not_found`] and [`SettlementError::is_conflict`]
/// rather than matching on variants when mapping to a transport-level status.
#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The checkout session {0} does not exist")]
    SessionNotFound(String),
    #[error("The payment could not be matched to an order. {0}")]
    UnmatchedPayment(String),
    #[error("The payment provider has not confirmed payment for {0}")]
    PaymentNotConfirmed(String),
    #[error("Checkout session {session_id} belongs to order {found:?}, not to {expected}")]
    MetadataMismatch { session_id: String, expected: OrderId, found: Option<OrderId> },
    #[error("Order {order_id} costs {expected}, but only {received} was paid")]
    Underpayment { order_id: OrderId, expected: Cents, received: Cents },
    #[error("{count} unpaid orders match the payer {email}. Refusing to guess")]
    AmbiguousPayer { email: String, count: usize },
    #[error("{0}")]
    ProviderError(PaymentProviderError),
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
}

impl SettlementError {
    /// The signal could not be resolved to an order or session.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound(_) | Self::SessionNotFound(_) | Self::UnmatchedPayment(_))
    }

    /// The order exists but settling it now would violate an integrity check.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PaymentNotConfirmed(_)
                | Self::MetadataMismatch { .. }
                | Self::Underpayment { .. }
                | Self::AmbiguousPayer { .. }
        )
    }
}

impl From<PaymentProviderError> for SettlementError {
    fn from(e: PaymentProviderError) -> Self {
        match e {
            PaymentProviderError::SessionNotFound(id) => Self::SessionNotFound(id),
            e => Self::ProviderError(e),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("An order must contain at least one item")]
    EmptyOrder,
    #[error("Product {0} is not in the catalog")]
    ProductNotFound(ProductId),
    #[error("Invalid quantity {1} for product {0}")]
    InvalidQuantity(ProductId, i64),
    #[error("The order total is too large")]
    TotalOutOfRange,
    #[error("A valid customer email address is required")]
    InvalidEmail,
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} has already been paid")]
    OrderAlreadyPaid(OrderId),
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
    #[error("{0}")]
    ProviderError(#[from] PaymentProviderError),
}
