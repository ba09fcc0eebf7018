use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    stripe::{NewCheckoutSession, StripeCheckoutSession},
    IntegrationError,
    StripeConfig,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, IntegrationError> {
        let mut headers = HeaderMap::with_capacity(1);
        let mut val = HeaderValue::from_str(format!("Bearer {}", config.secret_key.reveal()).as_str())
            .map_err(|e| IntegrationError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| IntegrationError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Sends a request to the Stripe API. Stripe takes its parameters form-encoded: as a query string for `GET`
    /// requests, and in the body otherwise.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, IntegrationError> {
        let url = self.url(path);
        trace!("💳️ Sending Stripe query: {method} {url}");
        let mut req = self.client.request(method.clone(), url);
        if !params.is_empty() {
            req = if method == Method::GET { req.query(params) } else { req.form(params) };
        }
        let response = req.send().await.map_err(|e| IntegrationError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ Stripe query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| IntegrationError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| IntegrationError::RestResponseError(e.to_string()))?;
            Err(IntegrationError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<StripeCheckoutSession, IntegrationError> {
        if !is_valid_object_id(session_id) {
            return Err(IntegrationError::RestRequestError(format!("'{session_id}' is not a valid session id")));
        }
        let path = format!("/v1/checkout/sessions/{session_id}");
        debug!("💳️ Fetching checkout session {session_id}");
        let session = self.rest_query::<StripeCheckoutSession>(Method::GET, &path, &[]).await?;
        debug!("💳️ Checkout session {session_id} is {}", session.payment_status);
        Ok(session)
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<StripeCheckoutSession, IntegrationError> {
        let params = session.form_params();
        debug!("💳️ Creating checkout session for {}", session.order_reference);
        let result = self.rest_query::<StripeCheckoutSession>(Method::POST, "/v1/checkout/sessions", &params).await?;
        info!("💳️ Created checkout session {} for {}", result.id, session.order_reference);
        Ok(result)
    }
}

/// Stripe object ids are ASCII alphanumerics and underscores. Anything else would end up in the request path.
fn is_valid_object_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
