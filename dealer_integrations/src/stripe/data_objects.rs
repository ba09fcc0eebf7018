use std::collections::HashMap;

use dealer_common::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::IntegrationError;

/// The metadata key under which the storefront stores its order id on every checkout session.
pub const ORDER_ID_METADATA_KEY: &str = "order_id";

//--------------------------------------  StripeCheckoutSession  -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    /// `paid`, `unpaid` or `no_payment_required`
    pub payment_status: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    /// Total in the currency's minor unit
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl StripeCheckoutSession {
    /// The storefront order this session was created for. The metadata entry takes precedence over
    /// `client_reference_id`.
    pub fn order_reference(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(ORDER_ID_METADATA_KEY))
            .or(self.client_reference_id.as_ref())
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    pub fn payer_email(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|d| d.email.as_deref()).or(self.customer_email.as_deref())
    }

    pub fn amount(&self) -> Option<Cents> {
        self.amount_total.map(Cents::from)
    }
}

//--------------------------------------   NewCheckoutSession    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount: Cents,
    pub quantity: i64,
}

/// A request to open a hosted, one-off payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckoutSession {
    /// The storefront order id. Stored in both the session metadata and `client_reference_id`.
    pub order_reference: String,
    pub customer_email: Option<String>,
    pub currency: String,
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

impl NewCheckoutSession {
    /// Flattens the request into Stripe's bracketed form encoding.
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("client_reference_id".to_string(), self.order_reference.clone()),
            (format!("metadata[{ORDER_ID_METADATA_KEY}]"), self.order_reference.clone()),
            (format!("payment_intent_data[metadata][{ORDER_ID_METADATA_KEY}]"), self.order_reference.clone()),
        ];
        if let Some(email) = &self.customer_email {
            params.push(("customer_email".to_string(), email.clone()));
        }
        let currency = self.currency.to_ascii_lowercase();
        for (i, item) in self.line_items.iter().enumerate() {
            let key = |field: &str| format!("line_items[{i}]{field}");
            params.push((key("[price_data][currency]"), currency.clone()));
            params.push((key("[price_data][product_data][name]"), item.name.clone()));
            params.push((key("[price_data][unit_amount]"), item.unit_amount.value().to_string()));
            params.push((key("[quantity]"), item.quantity.to_string()));
        }
        params
    }
}

//--------------------------------------       StripeEvent       -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeEventKind {
    /// The customer finished checkout. Card payments are paid at this point; delayed methods may still be pending.
    CheckoutCompleted,
    AsyncPaymentSucceeded,
    AsyncPaymentFailed,
    Other(String),
}

impl From<&str> for StripeEventKind {
    fn from(value: &str) -> Self {
        match value {
            "checkout.session.completed" => Self::CheckoutCompleted,
            "checkout.session.async_payment_succeeded" => Self::AsyncPaymentSucceeded,
            "checkout.session.async_payment_failed" => Self::AsyncPaymentFailed,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

impl StripeEvent {
    pub fn kind(&self) -> StripeEventKind {
        StripeEventKind::from(self.event_type.as_str())
    }

    /// The checkout session carried by a `checkout.session.*` event, or `None` for any other event.
    pub fn checkout_session(&self) -> Result<Option<StripeCheckoutSession>, IntegrationError> {
        if matches!(self.kind(), StripeEventKind::Other(_)) {
            return Ok(None);
        }
        let session = serde_json::from_value(self.data.object.clone())
            .map_err(|e| IntegrationError::JsonError(format!("Event {} has no checkout session. {e}", self.id)))?;
        Ok(Some(session))
    }
}
