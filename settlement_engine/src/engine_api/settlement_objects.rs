use dealer_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, PaymentMethod};

/// What a provider reports about a payment, in provider-neutral terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderPaymentStatus {
    Completed,
    Pending,
    Failed,
}

/// A payment-completion signal from a webhook, normalised by the integration layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSignal {
    pub method: PaymentMethod,
    /// The provider's identifier for the payment (checkout session id, capture id).
    pub reference: String,
    /// The order id the payment was created for, if the provider echoed it back.
    pub order_id: Option<OrderId>,
    pub payer_email: Option<String>,
    pub amount: Option<Cents>,
    pub currency: Option<String>,
    pub status: ProviderPaymentStatus,
}

impl PaymentSignal {
    pub fn new<S: Into<String>>(method: PaymentMethod, reference: S, status: ProviderPaymentStatus) -> Self {
        Self {
            method,
            reference: reference.into(),
            order_id: None,
            payer_email: None,
            amount: None,
            currency: None,
            status,
        }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_payer_email<S: Into<String>>(mut self, email: S) -> Self {
        self.payer_email = Some(email.into());
        self
    }

    pub fn with_amount<S: Into<String>>(mut self, amount: Cents, currency: S) -> Self {
        self.amount = Some(amount);
        self.currency = Some(currency.into());
        self
    }
}

/// Whether the customer was told about their settled order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    /// Mail is not configured for this deployment.
    Skipped,
    /// Invoice generation or delivery failed. The order remains paid.
    Failed { reason: String },
}

impl NotificationStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// This call performed the unpaid→paid transition.
    Settled { order: Order, notification: NotificationStatus },
    /// The order had been settled before. Nothing was changed and nothing was sent.
    AlreadySettled { order: Order },
}

impl SettlementOutcome {
    pub fn order(&self) -> &Order {
        match self {
            Self::Settled { order, .. } | Self::AlreadySettled { order } => order,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}
