use actix_web::http::header::HeaderMap;
use dealer_integrations::{
    stripe::{
        CheckoutLineItem,
        NewCheckoutSession,
        StripeApi,
        StripeCheckoutSession,
        StripeEvent,
        StripeEventKind,
        StripeSignatureVerifier,
        STRIPE_SIGNATURE_HEADER,
    },
    IntegrationError,
    StripeConfig,
    WebhookVerificationError,
};
use log::*;
use settlement_engine::{
    db_types::{OrderDetails, OrderId, PaymentMethod},
    settlement_objects::{PaymentSignal, ProviderPaymentStatus},
    traits::{CheckoutSession, CheckoutSessions, CheckoutUrls, PaymentProviderError, SessionPaymentStatus},
};

use crate::{integrations::SignalConversionError, middleware::WebhookVerifier};

/// Stripe Checkout, as seen by the settlement engine.
#[derive(Clone)]
pub struct StripeCheckout {
    api: StripeApi,
}

impl StripeCheckout {
    pub fn new(config: StripeConfig) -> Result<Self, IntegrationError> {
        Ok(Self { api: StripeApi::new(config)? })
    }
}

impl CheckoutSessions for StripeCheckout {
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentProviderError> {
        let session = self.api.retrieve_checkout_session(session_id).await.map_err(|e| match e {
            IntegrationError::RestRequestError(_) => PaymentProviderError::SessionNotFound(session_id.to_string()),
            e if e.is_not_found() => PaymentProviderError::SessionNotFound(session_id.to_string()),
            e => provider_error(e),
        })?;
        Ok(checkout_session_from_stripe(session))
    }

    async fn create_session(
        &self,
        details: &OrderDetails,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutSession, PaymentProviderError> {
        let order = &details.order;
        let request = NewCheckoutSession {
            order_reference: order.order_id.as_str().to_string(),
            customer_email: Some(order.customer.email.clone()),
            currency: order.currency.clone(),
            line_items: details
                .lines
                .iter()
                .map(|l| CheckoutLineItem {
                    name: l.item.product_name.clone(),
                    unit_amount: l.item.unit_price,
                    quantity: l.item.quantity,
                })
                .collect(),
            success_url: urls.success_url.clone(),
            cancel_url: urls.cancel_url.clone(),
        };
        let session = self.api.create_checkout_session(&request).await.map_err(provider_error)?;
        Ok(checkout_session_from_stripe(session))
    }
}

fn provider_error(e: IntegrationError) -> PaymentProviderError {
    match e {
        IntegrationError::RestResponseError(s) => PaymentProviderError::Unavailable(s),
        IntegrationError::QueryError { status, message } if status >= 500 => {
            PaymentProviderError::Unavailable(format!("Error {status}. {message}"))
        },
        IntegrationError::QueryError { status, message } => {
            PaymentProviderError::Rejected(format!("Error {status}. {message}"))
        },
        IntegrationError::JsonError(s) => PaymentProviderError::InvalidResponse(s),
        e => PaymentProviderError::Rejected(e.to_string()),
    }
}

pub fn checkout_session_from_stripe(session: StripeCheckoutSession) -> CheckoutSession {
    let payment_status = match session.payment_status.as_str() {
        "paid" => SessionPaymentStatus::Paid,
        "no_payment_required" => SessionPaymentStatus::NoPaymentRequired,
        _ => SessionPaymentStatus::Unpaid,
    };
    CheckoutSession {
        order_id: session.order_reference().map(OrderId::from),
        customer_email: session.payer_email().map(String::from),
        amount_total: session.amount(),
        currency: session.currency.clone(),
        url: session.url.clone(),
        payment_status,
        session_id: session.id,
    }
}

/// Converts a Stripe webhook event into a payment signal. Returns `Ok(None)` for events that say nothing about a
/// checkout payment.
pub fn signal_from_stripe_event(event: &StripeEvent) -> Result<Option<PaymentSignal>, SignalConversionError> {
    let kind = event.kind();
    let Some(session) = event.checkout_session().map_err(|e| SignalConversionError::FormatError(e.to_string()))?
    else {
        return Ok(None);
    };
    let status = match kind {
        StripeEventKind::CheckoutCompleted if session.is_paid() => ProviderPaymentStatus::Completed,
        // Delayed payment methods complete checkout before the money arrives
        StripeEventKind::CheckoutCompleted => ProviderPaymentStatus::Pending,
        StripeEventKind::AsyncPaymentSucceeded => ProviderPaymentStatus::Completed,
        StripeEventKind::AsyncPaymentFailed => ProviderPaymentStatus::Failed,
        StripeEventKind::Other(_) => return Ok(None),
    };
    let mut signal = PaymentSignal::new(PaymentMethod::Stripe, session.id.clone(), status);
    if let Some(order_id) = session.order_reference() {
        signal = signal.with_order_id(OrderId::from(order_id));
    }
    if let Some(email) = session.payer_email() {
        signal = signal.with_payer_email(email);
    }
    if let (Some(amount), Some(currency)) = (session.amount(), session.currency.as_deref()) {
        signal = signal.with_amount(amount, currency);
    }
    trace!("💳️ Stripe event {} converted to {signal:?}", event.id);
    Ok(Some(signal))
}

#[derive(Clone)]
pub struct StripeWebhookVerifier {
    verifier: StripeSignatureVerifier,
}

impl StripeWebhookVerifier {
    pub fn new(config: &StripeConfig) -> Self {
        let verifier = StripeSignatureVerifier::new(config.webhook_secret.clone(), config.webhook_tolerance);
        Self { verifier }
    }
}

impl WebhookVerifier for StripeWebhookVerifier {
    fn provider(&self) -> &'static str {
        "Stripe"
    }

    async fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookVerificationError> {
        let header = headers
            .get(STRIPE_SIGNATURE_HEADER)
            .ok_or_else(|| WebhookVerificationError::MissingHeader(STRIPE_SIGNATURE_HEADER.to_string()))?
            .to_str()
            .map_err(|e| WebhookVerificationError::MalformedHeader(e.to_string()))?;
        self.verifier.verify(body, header)
    }
}
