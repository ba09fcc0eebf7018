//! Webhook authentication middleware for Actix Web.
//!
//! Payment providers sign their webhook deliveries, and each does it differently. Stripe sends an HMAC of the body in
//! the `Stripe-Signature` header; PayPal sends a set of transmission headers that must be checked with PayPal's
//! verification API. A [`WebhookVerifier`] captures one such scheme, and [`WebhookAuthMiddlewareFactory`] applies it
//! to every request in a scope.
//!
//! Verification needs the raw body bytes, so the middleware reads the body, verifies it, and puts it back for the
//! route handler.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden, ErrorServiceUnavailable},
    http::header::HeaderMap,
    web,
    Error,
};
use dealer_integrations::WebhookVerificationError;
use futures::future::LocalBoxFuture;
use log::{trace, warn};

/// Checks that a webhook delivery really came from the provider.
#[allow(async_fn_in_trait)]
pub trait WebhookVerifier: Clone + 'static {
    /// A short name for log messages
    fn provider(&self) -> &'static str;

    async fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WebhookVerificationError>;
}

pub struct WebhookAuthMiddlewareFactory<V> {
    verifier: V,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl<V: WebhookVerifier> WebhookAuthMiddlewareFactory<V> {
    pub fn new(verifier: V, enabled: bool) -> Self {
        WebhookAuthMiddlewareFactory { verifier, enabled }
    }
}

impl<S, B, V> Transform<S, ServiceRequest> for WebhookAuthMiddlewareFactory<V>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    V: WebhookVerifier,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookAuthMiddlewareService<S, V>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookAuthMiddlewareService {
            verifier: self.verifier.clone(),
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct WebhookAuthMiddlewareService<S, V> {
    verifier: V,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B, V> Service<ServiceRequest> for WebhookAuthMiddlewareService<S, V>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    V: WebhookVerifier,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = self.verifier.clone();
        let enabled = self.enabled;
        Box::pin(async move {
            let provider = verifier.provider();
            trace!("🔐️ Checking {provider} webhook signature");
            if !enabled {
                trace!("🔐️ {provider} signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            match verifier.verify(req.headers(), data.as_ref()).await {
                Ok(()) => {
                    trace!("🔐️ {provider} webhook signature ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(WebhookVerificationError::VerificationFailed(e)) => {
                    warn!("🔐️ Could not verify {provider} webhook. {e}");
                    Err(ErrorServiceUnavailable("Webhook signature could not be verified."))
                },
                Err(e) => {
                    warn!("🔐️ {provider} webhook rejected. {e}");
                    Err(ErrorForbidden(e.to_string()))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
