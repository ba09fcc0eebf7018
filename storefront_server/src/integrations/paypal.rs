use actix_web::http::header::HeaderMap;
use dealer_integrations::{
    paypal::{PaypalApi, PaypalPaymentStatus, PaypalWebhookEvent, PaypalWebhookHeaders},
    WebhookVerificationError,
};
use log::*;
use settlement_engine::{
    db_types::{OrderId, PaymentMethod},
    settlement_objects::{PaymentSignal, ProviderPaymentStatus},
};

use crate::{integrations::SignalConversionError, middleware::WebhookVerifier};

/// Converts a PayPal webhook event into a payment signal. Returns `Ok(None)` for events that say nothing about a
/// payment.
pub fn signal_from_paypal_event(event: &PaypalWebhookEvent) -> Result<Option<PaymentSignal>, SignalConversionError> {
    let Some(payment) = event.payment().map_err(|e| SignalConversionError::FormatError(e.to_string()))? else {
        return Ok(None);
    };
    let status = match payment.status {
        PaypalPaymentStatus::Completed => ProviderPaymentStatus::Completed,
        PaypalPaymentStatus::Pending => ProviderPaymentStatus::Pending,
        PaypalPaymentStatus::Denied => ProviderPaymentStatus::Failed,
    };
    let mut signal = PaymentSignal::new(PaymentMethod::Paypal, payment.reference, status);
    if let Some(order_id) = payment.order_reference {
        signal = signal.with_order_id(OrderId::from(order_id));
    }
    if let Some(email) = payment.payer_email {
        signal = signal.with_payer_email(email);
    }
    if let Some(amount) = payment.amount {
        let cents = amount.cents().map_err(|e| SignalConversionError::InvalidAmount(e.to_string()))?;
        signal = signal.with_amount(cents, amount.currency_code.to_ascii_lowercase());
    }
    trace!("💳️ PayPal event {} converted to {signal:?}", event.id);
    Ok(Some(signal))
}

#[derive(Clone)]
pub struct PaypalWebhookVerifier {
    api: PaypalApi,
}

impl PaypalWebhookVerifier {
    pub fn new(api: PaypalApi) -> Self {
        Self { api }
    }
}

impl WebhookVerifier for PaypalWebhookVerifier {
    fn provider(&self) -> &'static str {
        "PayPal"
    }

    async fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookVerificationError> {
        let transmission = PaypalWebhookHeaders::from_lookup(|name| {
            headers.get(name).and_then(|v| v.to_str().ok()).map(String::from)
        })?;
        self.api.verify_webhook_signature(&transmission, body).await
    }
}
