use dealer_common::Cents;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderDetails, OrderId};

/// Payment status of a redirect checkout session, as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl SessionPaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, SessionPaymentStatus::Paid)
    }
}

/// The subset of a provider's checkout session that the settlement flow relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub payment_status: SessionPaymentStatus,
    /// The order id embedded in the session metadata when the session was created.
    pub order_id: Option<OrderId>,
    pub customer_email: Option<String>,
    pub amount_total: Option<Cents>,
    pub currency: Option<String>,
    /// The hosted checkout page. Only present on newly created sessions.
    pub url: Option<String>,
}

/// Where the provider sends the customer after checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// A redirect-checkout payment provider.
#[allow(async_fn_in_trait)]
pub trait CheckoutSessions: Clone {
    /// Retrieves the checkout session with the given id from the provider.
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentProviderError>;

    /// Creates a new checkout session for the order. Implementations must embed the order id in the session so that
    /// webhooks and redirect confirmations can be resolved back to the order.
    async fn create_session(
        &self,
        order: &OrderDetails,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutSession, PaymentProviderError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentProviderError {
    #[error("The checkout session {0} does not exist")]
    SessionNotFound(String),
    #[error("Could not reach the payment provider. {0}")]
    Unavailable(String),
    #[error("The payment provider rejected the request. {0}")]
    Rejected(String),
    #[error("Unexpected response from the payment provider. {0}")]
    InvalidResponse(String),
}
