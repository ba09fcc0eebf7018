use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::value::RawValue;
use tokio::sync::Mutex;

use crate::{IntegrationError, PaypalConfig, WebhookVerificationError};

/// Tokens are refreshed this long before PayPal says they expire.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PaypalApi {
    config: PaypalConfig,
    client: Arc<Client>,
    token: Arc<Mutex<Option<AccessToken>>>,
}

/// The transmission headers PayPal attaches to every webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaypalWebhookHeaders {
    pub auth_algo: String,
    pub cert_url: String,
    pub transmission_id: String,
    pub transmission_sig: String,
    pub transmission_time: String,
}

impl PaypalWebhookHeaders {
    /// Collects the transmission headers using `lookup`, which is given each (case-insensitive) header name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WebhookVerificationError>
    where F: Fn(&str) -> Option<String> {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| WebhookVerificationError::MissingHeader(name.to_string()))
        };
        Ok(Self {
            auth_algo: get("paypal-auth-algo")?,
            cert_url: get("paypal-cert-url")?,
            transmission_id: get("paypal-transmission-id")?,
            transmission_sig: get("paypal-transmission-sig")?,
            transmission_time: get("paypal-transmission-time")?,
        })
    }
}

#[derive(Serialize)]
struct VerifySignatureRequest<'a> {
    auth_algo: &'a str,
    cert_url: &'a str,
    transmission_id: &'a str,
    transmission_sig: &'a str,
    transmission_time: &'a str,
    webhook_id: &'a str,
    // Passed through verbatim. Re-serialising the event could reorder its fields and break the signature.
    webhook_event: &'a RawValue,
}

#[derive(Deserialize)]
struct VerifySignatureResponse {
    verification_status: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl PaypalApi {
    pub fn new(config: PaypalConfig) -> Result<Self, IntegrationError> {
        let client = Client::builder().build().map_err(|e| IntegrationError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), token: Arc::new(Mutex::new(None)) })
    }

    pub fn config(&self) -> &PaypalConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Returns a cached OAuth token, fetching a new one with the client credentials grant if necessary.
    pub async fn access_token(&self) -> Result<String, IntegrationError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) {
                return Ok(token.token.clone());
            }
        }
        debug!("💳️ Requesting a new PayPal access token");
        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(self.config.client_secret.reveal()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| IntegrationError::AuthenticationError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(IntegrationError::AuthenticationError(format!("Error {status}. {message}")));
        }
        let token =
            response.json::<TokenResponse>().await.map_err(|e| IntegrationError::JsonError(e.to_string()))?;
        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        *cached = Some(AccessToken { token: token.access_token.clone(), expires_at });
        info!("💳️ New PayPal access token obtained. It expires at {expires_at}");
        Ok(token.access_token)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, IntegrationError> {
        let token = self.access_token().await?;
        let url = self.url(path);
        trace!("💳️ Sending PayPal query: {method} {url}");
        let mut req = self.client.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| IntegrationError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ PayPal query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| IntegrationError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| IntegrationError::RestResponseError(e.to_string()))?;
            Err(IntegrationError::QueryError { status, message })
        }
    }

    /// Asks PayPal whether `body` was sent by PayPal for this storefront's webhook.
    pub async fn verify_webhook_signature(
        &self,
        headers: &PaypalWebhookHeaders,
        body: &[u8],
    ) -> Result<(), WebhookVerificationError> {
        if self.config.webhook_id.is_empty() {
            return Err(WebhookVerificationError::VerificationFailed("No PayPal webhook id is configured".into()));
        }
        let event = serde_json::from_slice::<&RawValue>(body)
            .map_err(|e| WebhookVerificationError::VerificationFailed(format!("Body is not JSON. {e}")))?;
        let request = VerifySignatureRequest {
            auth_algo: &headers.auth_algo,
            cert_url: &headers.cert_url,
            transmission_id: &headers.transmission_id,
            transmission_sig: &headers.transmission_sig,
            transmission_time: &headers.transmission_time,
            webhook_id: &self.config.webhook_id,
            webhook_event: event,
        };
        let response = self
            .rest_query::<VerifySignatureResponse, _>(
                Method::POST,
                "/v1/notifications/verify-webhook-signature",
                Some(&request),
            )
            .await
            .map_err(|e| WebhookVerificationError::VerificationFailed(e.to_string()))?;
        if response.verification_status.eq_ignore_ascii_case("SUCCESS") {
            trace!("🔐️ PayPal webhook {} verified", headers.transmission_id);
            Ok(())
        } else {
            warn!(
                "🔐️ PayPal reported {} for webhook transmission {}",
                response.verification_status, headers.transmission_id
            );
            Err(WebhookVerificationError::InvalidSignature)
        }
    }
}
