use dealer_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{parse_decimal_amount, IntegrationError};

/// PayPal fills in `reference_id` with this when the merchant does not supply one.
const DEFAULT_REFERENCE_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaypalEventKind {
    CaptureCompleted,
    CapturePending,
    CaptureDenied,
    OrderCompleted,
    Other(String),
}

impl From<&str> for PaypalEventKind {
    fn from(value: &str) -> Self {
        match value {
            "PAYMENT.CAPTURE.COMPLETED" => Self::CaptureCompleted,
            "PAYMENT.CAPTURE.PENDING" => Self::CapturePending,
            "PAYMENT.CAPTURE.DENIED" | "PAYMENT.CAPTURE.DECLINED" => Self::CaptureDenied,
            "CHECKOUT.ORDER.COMPLETED" => Self::OrderCompleted,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaypalWebhookEvent {
    pub id: String,
    pub event_type: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub create_time: Option<String>,
    pub resource: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalAmount {
    pub currency_code: String,
    /// A decimal string, e.g. "18500.00"
    pub value: String,
}

impl PaypalAmount {
    pub fn cents(&self) -> Result<Cents, IntegrationError> {
        parse_decimal_amount(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalCapture {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<PaypalAmount>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PaypalPurchaseUnit>,
    #[serde(default)]
    pub payer: Option<PaypalPayer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalPurchaseUnit {
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub amount: Option<PaypalAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalPayer {
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaypalPaymentStatus {
    Completed,
    Pending,
    Denied,
}

/// The payment-relevant facts of a PayPal webhook, whichever resource type carried them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaypalPayment {
    /// The capture id or PayPal order id
    pub reference: String,
    /// The storefront order id, echoed back from `custom_id`, `invoice_id` or `reference_id`.
    pub order_reference: Option<String>,
    pub payer_email: Option<String>,
    pub amount: Option<PaypalAmount>,
    pub status: PaypalPaymentStatus,
}

impl PaypalWebhookEvent {
    pub fn kind(&self) -> PaypalEventKind {
        PaypalEventKind::from(self.event_type.as_str())
    }

    /// Extracts the payment from a capture or order event. Returns `None` for every other event type.
    pub fn payment(&self) -> Result<Option<PaypalPayment>, IntegrationError> {
        let status = match self.kind() {
            PaypalEventKind::CaptureCompleted => PaypalPaymentStatus::Completed,
            PaypalEventKind::CapturePending => PaypalPaymentStatus::Pending,
            PaypalEventKind::CaptureDenied => PaypalPaymentStatus::Denied,
            PaypalEventKind::OrderCompleted => return self.order_payment().map(Some),
            PaypalEventKind::Other(_) => return Ok(None),
        };
        let capture: PaypalCapture = self.parse_resource()?;
        Ok(Some(PaypalPayment {
            reference: capture.id,
            order_reference: first_reference([capture.custom_id, capture.invoice_id]),
            payer_email: None,
            amount: capture.amount,
            status,
        }))
    }

    fn order_payment(&self) -> Result<PaypalPayment, IntegrationError> {
        let order: PaypalOrder = self.parse_resource()?;
        let unit = order.purchase_units.into_iter().next();
        let (order_reference, amount) = match unit {
            Some(u) => {
                let reference_id = u.reference_id.filter(|r| r != DEFAULT_REFERENCE_ID);
                (first_reference([u.custom_id, u.invoice_id, reference_id]), u.amount)
            },
            None => (None, None),
        };
        let status = if order.status.eq_ignore_ascii_case("COMPLETED") {
            PaypalPaymentStatus::Completed
        } else {
            PaypalPaymentStatus::Pending
        };
        Ok(PaypalPayment {
            reference: order.id,
            order_reference,
            payer_email: order.payer.and_then(|p| p.email_address),
            amount,
            status,
        })
    }

    fn parse_resource<T: serde::de::DeserializeOwned>(&self) -> Result<T, IntegrationError> {
        serde_json::from_value(self.resource.clone())
            .map_err(|e| IntegrationError::JsonError(format!("Unexpected resource in event {}. {e}", self.id)))
    }
}

fn first_reference<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|s| !s.trim().is_empty())
}
