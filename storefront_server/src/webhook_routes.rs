//! Stripe and PayPal webhook handlers.
//!
//! Both routes are mounted behind the [`crate::middleware::WebhookAuthMiddlewareFactory`], so by the time a handler
//! runs the body is known to come from the provider.
//!
//! Providers retry any delivery that is not answered with a 2xx status. Events that can never succeed on a retry
//! (an unknown order, or a payment that is still pending and will be announced again by a later event) are therefore
//! acknowledged with a 200 and a failure message. Integrity conflicts, such as an underpayment, return 409 so that
//! they show up as failed deliveries in the provider's dashboard.
use actix_web::{web, HttpRequest, HttpResponse};
use dealer_integrations::{paypal::PaypalWebhookEvent, stripe::StripeEvent};
use log::*;
use serde::de::DeserializeOwned;
use settlement_engine::{
    documents::DocumentGenerator,
    notifications::Notifier,
    settlement_objects::SettlementOutcome,
    traits::{CheckoutSessions, OrderStore},
    SettlementApi,
    SettlementError,
};

use crate::{
    data_objects::JsonResponse,
    errors::ServerError,
    integrations::{paypal::signal_from_paypal_event, stripe::signal_from_stripe_event},
    route,
};

route!(stripe_webhook => Post "" impl OrderStore, CheckoutSessions, DocumentGenerator, Notifier);
pub async fn stripe_webhook<B, S, D, N>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<SettlementApi<B, S, D, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: CheckoutSessions,
    D: DocumentGenerator,
    N: Notifier,
{
    trace!("💻️ Received Stripe webhook request: {}", req.uri());
    let event = parse_event::<StripeEvent>(&body)?;
    let signal = match signal_from_stripe_event(&event) {
        Ok(Some(signal)) => signal,
        Ok(None) => {
            debug!("💻️ Ignoring Stripe {} event {}", event.event_type, event.id);
            return Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} ignored", event.event_type))));
        },
        Err(e) => {
            warn!("💻️ Stripe event {} could not be converted. {e}", event.id);
            return Err(ServerError::CouldNotDeserializePayload(e.to_string()));
        },
    };
    info!("💻️ Stripe event {} ({}) for session {}", event.id, event.event_type, signal.reference);
    webhook_response(api.process_payment_signal(signal).await)
}

route!(paypal_webhook => Post "" impl OrderStore, CheckoutSessions, DocumentGenerator, Notifier);
pub async fn paypal_webhook<B, S, D, N>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<SettlementApi<B, S, D, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderStore,
    S: CheckoutSessions,
    D: DocumentGenerator,
    N: Notifier,
{
    trace!("💻️ Received PayPal webhook request: {}", req.uri());
    let event = parse_event::<PaypalWebhookEvent>(&body)?;
    let signal = match signal_from_paypal_event(&event) {
        Ok(Some(signal)) => signal,
        Ok(None) => {
            debug!("💻️ Ignoring PayPal {} event {}", event.event_type, event.id);
            return Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} ignored", event.event_type))));
        },
        Err(e) => {
            warn!("💻️ PayPal event {} could not be converted. {e}", event.id);
            return Err(ServerError::CouldNotDeserializePayload(e.to_string()));
        },
    };
    info!("💻️ PayPal event {} ({}) for payment {}", event.id, event.event_type, signal.reference);
    webhook_response(api.process_payment_signal(signal).await)
}

fn parse_event<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServerError> {
    serde_json::from_slice::<T>(body).map_err(|e| {
        debug!("💻️ Webhook body is not a recognised event. {e}");
        ServerError::CouldNotDeserializePayload(e.to_string())
    })
}

fn webhook_response(result: Result<SettlementOutcome, SettlementError>) -> Result<HttpResponse, ServerError> {
    match result {
        Ok(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        Err(e) if e.is_not_found() || matches!(e, SettlementError::PaymentNotConfirmed(_)) => {
            info!("💻️ Webhook acknowledged without settling an order. {e}");
            Ok(HttpResponse::Ok().json(JsonResponse::failure(e)))
        },
        Err(e) => {
            warn!("💻️ Webhook could not be processed. {e}");
            Err(e.into())
        },
    }
}
