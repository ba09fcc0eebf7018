use dealer_common::{helpers::env_non_empty, Cents};
use log::*;
use minijinja::Environment;
use serde::Serialize;

use crate::{
    db_types::{OrderDetails, OrderLine},
    documents::{Document, DocumentError, DocumentGenerator, PdfRenderer},
};

const INVOICE_TEMPLATE: &str = include_str!("../../templates/invoice.html.jinja");
// The .html suffix switches on HTML auto-escaping
const INVOICE_TEMPLATE_NAME: &str = "invoice.html";
const NOT_AVAILABLE: &str = "N/A";

/// The letterhead printed at the top of every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealershipInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for DealershipInfo {
    fn default() -> Self {
        Self {
            name: "Dealership".to_string(),
            address: "123 Main Street".to_string(),
            phone: "555-0100".to_string(),
            email: "sales@dealership.example".to_string(),
        }
    }
}

impl DealershipInfo {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let name = env_non_empty("DSF_DEALERSHIP_NAME").unwrap_or_else(|| {
            warn!("🪛️ DSF_DEALERSHIP_NAME is not set. Invoices will use a placeholder letterhead.");
            defaults.name
        });
        Self {
            name,
            address: env_non_empty("DSF_DEALERSHIP_ADDRESS").unwrap_or(defaults.address),
            phone: env_non_empty("DSF_DEALERSHIP_PHONE").unwrap_or(defaults.phone),
            email: env_non_empty("DSF_DEALERSHIP_EMAIL").unwrap_or(defaults.email),
        }
    }
}

/// Renders order invoices from the embedded HTML template, and converts them to PDF with `R`.
#[derive(Debug, Clone)]
pub struct InvoiceGenerator<R> {
    templates: Environment<'static>,
    dealership: DealershipInfo,
    renderer: R,
}

impl<R: PdfRenderer> InvoiceGenerator<R> {
    pub fn new(dealership: DealershipInfo, renderer: R) -> Result<Self, DocumentError> {
        let mut templates = Environment::new();
        templates.add_template(INVOICE_TEMPLATE_NAME, INVOICE_TEMPLATE)?;
        Ok(Self { templates, dealership, renderer })
    }

    pub fn dealership(&self) -> &DealershipInfo {
        &self.dealership
    }

    /// Renders the invoice HTML. The only time-dependent value in the output is the order's own creation date.
    pub fn render_html(&self, details: &OrderDetails) -> Result<String, DocumentError> {
        let context = InvoiceContext::new(&self.dealership, details);
        let template = self.templates.get_template(INVOICE_TEMPLATE_NAME)?;
        let html = template.render(&context)?;
        trace!("📄️ Rendered invoice HTML for order {}", details.order.order_id);
        Ok(html)
    }
}

impl<R: PdfRenderer> DocumentGenerator for InvoiceGenerator<R> {
    async fn generate_invoice(&self, details: &OrderDetails) -> Result<Document, DocumentError> {
        let html = self.render_html(details)?;
        let pdf = self.renderer.render_pdf(&html).await?;
        let file_name = format!("invoice-{}.pdf", details.order.order_number);
        debug!("📄️ Invoice {file_name} generated for order {}", details.order.order_id);
        Ok(Document::pdf(file_name, pdf))
    }
}

//--------------------------------------   Template context    ---------------------------------------------------------
#[derive(Serialize)]
struct InvoiceContext<'a> {
    dealership: &'a DealershipInfo,
    order: OrderSection,
    customer: CustomerSection,
    lines: Vec<LineSection>,
    totals: TotalsSection,
}

#[derive(Serialize)]
struct OrderSection {
    number: i64,
    id: String,
    date: String,
    status: &'static str,
    payment_method: String,
    payment_reference: String,
}

#[derive(Serialize)]
struct CustomerSection {
    name: String,
    email: String,
    phone: String,
    address: String,
}

#[derive(Serialize)]
struct LineSection {
    name: String,
    make: String,
    model: String,
    year: String,
    mileage: String,
    fuel_type: String,
    color: String,
    quantity: i64,
    unit_price: String,
    amount: String,
}

#[derive(Serialize)]
struct TotalsSection {
    subtotal: String,
    tax: String,
    fees: String,
    total: String,
    currency: String,
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).filter(|s| !s.trim().is_empty()).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

impl<'a> InvoiceContext<'a> {
    fn new(dealership: &'a DealershipInfo, details: &OrderDetails) -> Self {
        let order = &details.order;
        let subtotal = details.subtotal();
        // Tax and fees are not charged online
        let tax = Cents::default();
        let fees = Cents::default();
        Self {
            dealership,
            order: OrderSection {
                number: order.order_number,
                id: order.order_id.as_str().to_string(),
                date: order.created_at.format("%Y-%m-%d").to_string(),
                status: if order.is_paid { "Paid" } else { "Awaiting payment" },
                payment_method: or_na(order.payment_method),
                payment_reference: or_na(order.payment_reference.as_ref()),
            },
            customer: CustomerSection {
                name: order.customer.name.clone(),
                email: order.customer.email.clone(),
                phone: or_na(order.customer.phone.as_ref()),
                address: or_na(order.customer.address.as_ref()),
            },
            lines: details.lines.iter().map(LineSection::from).collect(),
            totals: TotalsSection {
                subtotal: subtotal.to_string(),
                tax: tax.to_string(),
                fees: fees.to_string(),
                total: (subtotal + tax + fees).to_string(),
                currency: order.currency.to_ascii_uppercase(),
            },
        }
    }
}

impl From<&OrderLine> for LineSection {
    fn from(line: &OrderLine) -> Self {
        let product = line.product.as_ref();
        Self {
            name: line.item.product_name.clone(),
            make: or_na(product.and_then(|p| p.make.as_ref())),
            model: or_na(product.and_then(|p| p.model.as_ref())),
            year: or_na(product.and_then(|p| p.year)),
            mileage: or_na(product.and_then(|p| p.mileage).map(|m| format!("{m} mi"))),
            fuel_type: or_na(product.and_then(|p| p.fuel_type.as_ref())),
            color: or_na(product.and_then(|p| p.color.as_ref())),
            quantity: line.item.quantity,
            unit_price: line.item.unit_price.to_string(),
            amount: line.item.line_total().to_string(),
        }
    }
}
