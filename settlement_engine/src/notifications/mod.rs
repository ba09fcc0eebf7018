//! Customer notifications.
//!
//! The [`Notifier`] is what the settlement flow talks to. [`EmailNotifier`] is the only implementation; it renders
//! the order confirmation email and passes it to a [`MailTransport`]. A notifier without a transport is valid, and
//! reports every notification as [`DeliveryStatus::Skipped`].
mod email;

pub use email::EmailNotifier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{db_types::OrderDetails, documents::Document};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl From<Document> for Attachment {
    fn from(doc: Document) -> Self {
        Self { file_name: doc.file_name, content_type: doc.content_type, content: doc.bytes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    /// No mail transport is configured in this deployment.
    Skipped,
}

/// Outbound mail delivery to a single recipient.
#[allow(async_fn_in_trait)]
pub trait MailTransport: Clone {
    async fn send(&self, message: MailMessage) -> Result<(), NotifierError>;
}

#[allow(async_fn_in_trait)]
pub trait Notifier: Clone {
    /// Emails the order confirmation to the customer on the order, with the given documents attached.
    async fn send_order_confirmation(
        &self,
        details: &OrderDetails,
        attachments: Vec<Attachment>,
    ) -> Result<DeliveryStatus, NotifierError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Could not render the email template. {0}")]
    TemplateError(String),
    #[error("The order has no valid recipient address: '{0}'")]
    InvalidRecipient(String),
    #[error("The mail transport rejected the message. {0}")]
    TransportError(String),
}

impl From<minijinja::Error> for NotifierError {
    fn from(e: minijinja::Error) -> Self {
        NotifierError::TemplateError(e.to_string())
    }
}
