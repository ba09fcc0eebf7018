//! A client for JSON transactional mail APIs (Resend, Postmark and friends all accept roughly this shape).
use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::Serialize;

use crate::{IntegrationError, MailConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundAttachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<OutboundAttachment>,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentBody<'a>>,
}

#[derive(Serialize)]
struct AttachmentBody<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// base64
    content: String,
}

impl<'a> From<&'a OutboundEmail> for SendEmailRequest<'a> {
    fn from(email: &'a OutboundEmail) -> Self {
        Self {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentBody {
                    filename: &a.file_name,
                    content_type: &a.content_type,
                    content: base64::encode(&a.content),
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct HttpMailApi {
    url: String,
    client: Arc<Client>,
}

impl HttpMailApi {
    /// Returns `Ok(None)` if mail is not configured.
    pub fn new(config: &MailConfig) -> Result<Option<Self>, IntegrationError> {
        let Some(url) = config.api_url.clone() else {
            return Ok(None);
        };
        let mut headers = HeaderMap::with_capacity(1);
        if !config.api_key.is_empty() {
            let mut val = HeaderValue::from_str(format!("Bearer {}", config.api_key.reveal()).as_str())
                .map_err(|e| IntegrationError::Initialization(e.to_string()))?;
            val.set_sensitive(true);
            headers.insert(AUTHORIZATION, val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| IntegrationError::Initialization(e.to_string()))?;
        Ok(Some(Self { url, client: Arc::new(client) }))
    }

    pub async fn send(&self, email: &OutboundEmail) -> Result<(), IntegrationError> {
        let body = SendEmailRequest::from(email);
        trace!("✉️ Posting email '{}' to the mail API", email.subject);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IntegrationError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            debug!("✉️ Mail API accepted '{}' with {} attachment(s)", email.subject, email.attachments.len());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| IntegrationError::RestResponseError(e.to_string()))?;
            Err(IntegrationError::QueryError { status, message })
        }
    }
}
