//! Invoice and voucher generation.
//!
//! An invoice is rendered in two stages. [`InvoiceGenerator`] fills an HTML template with the order, customer and
//! vehicle details, and then hands the HTML to a [`PdfRenderer`] to produce the final PDF bytes.
mod html_to_pdf;
mod invoice;

pub use html_to_pdf::HtmlToPdfCommand;
pub use invoice::{DealershipInfo, InvoiceGenerator};
use thiserror::Error;

use crate::db_types::OrderDetails;

/// A rendered document, ready to be attached to an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn pdf<S: Into<String>>(file_name: S, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: "application/pdf".to_string(), bytes }
    }
}

#[allow(async_fn_in_trait)]
pub trait DocumentGenerator: Clone {
    /// Produces the invoice for a fully hydrated order. Identical input yields identical output.
    async fn generate_invoice(&self, details: &OrderDetails) -> Result<Document, DocumentError>;
}

/// Converts an HTML document into PDF bytes.
#[allow(async_fn_in_trait)]
pub trait PdfRenderer: Clone {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, DocumentError>;
}

#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    #[error("Could not render the document template. {0}")]
    TemplateError(String),
    #[error("The PDF renderer failed. {0}")]
    RenderError(String),
    #[error("The PDF renderer did not complete within {0} seconds")]
    RenderTimeout(u64),
    #[error("I/O error while rendering the document. {0}")]
    IoError(String),
}

impl From<minijinja::Error> for DocumentError {
    fn from(e: minijinja::Error) -> Self {
        DocumentError::TemplateError(e.to_string())
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::IoError(e.to_string())
    }
}
