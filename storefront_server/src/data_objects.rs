use std::fmt::Display;

use serde::{Deserialize, Serialize};
use settlement_engine::{db_types::OrderId, traits::CheckoutSession};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Query parameters on the page Stripe redirects the customer to after checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmCheckoutParams {
    pub session_id: String,
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutStarted {
    pub session_id: String,
    /// The hosted payment page to send the customer to.
    pub url: Option<String>,
}

impl From<CheckoutSession> for CheckoutStarted {
    fn from(session: CheckoutSession) -> Self {
        Self { session_id: session.session_id, url: session.url }
    }
}
