use log::*;
use minijinja::{context, Environment};

use crate::{
    db_types::OrderDetails,
    documents::DealershipInfo,
    notifications::{Attachment, DeliveryStatus, MailMessage, MailTransport, NotifierError, Notifier},
};

const CONFIRMATION_TEMPLATE: &str = include_str!("../../templates/order_confirmation.html.jinja");
const CONFIRMATION_TEMPLATE_NAME: &str = "order_confirmation.html";

#[derive(Debug, Clone)]
pub struct EmailNotifier<M> {
    transport: Option<M>,
    from: String,
    dealership: DealershipInfo,
    templates: Environment<'static>,
}

impl<M: MailTransport> EmailNotifier<M> {
    pub fn new<S: Into<String>>(
        transport: Option<M>,
        from: S,
        dealership: DealershipInfo,
    ) -> Result<Self, NotifierError> {
        let mut templates = Environment::new();
        templates.add_template(CONFIRMATION_TEMPLATE_NAME, CONFIRMATION_TEMPLATE)?;
        if transport.is_none() {
            warn!("✉️ No mail transport has been configured. Order confirmation emails will not be sent.");
        }
        Ok(Self { transport, from: from.into(), dealership, templates })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub fn render_confirmation(&self, details: &OrderDetails, has_invoice: bool) -> Result<MailMessage, NotifierError> {
        let order = &details.order;
        let items = details
            .lines
            .iter()
            .map(|l| context! { name => l.item.product_name, quantity => l.item.quantity })
            .collect::<Vec<_>>();
        let html_body = self.templates.get_template(CONFIRMATION_TEMPLATE_NAME)?.render(context! {
            customer_name => order.customer.name,
            dealership_name => self.dealership.name,
            dealership_phone => self.dealership.phone,
            order_number => order.order_number,
            total => order.total_price.to_string(),
            currency => order.currency.to_ascii_uppercase(),
            items => items,
            has_invoice => has_invoice,
        })?;
        Ok(MailMessage {
            from: self.from.clone(),
            to: order.customer.email.trim().to_string(),
            subject: format!("Your order #{} with {} is confirmed", order.order_number, self.dealership.name),
            html_body,
            attachments: Vec::new(),
        })
    }
}

impl<M: MailTransport> Notifier for EmailNotifier<M> {
    async fn send_order_confirmation(
        &self,
        details: &OrderDetails,
        attachments: Vec<Attachment>,
    ) -> Result<DeliveryStatus, NotifierError> {
        let Some(transport) = &self.transport else {
            info!("✉️ Mail is not configured. Skipping confirmation email for order {}", details.order.order_id);
            return Ok(DeliveryStatus::Skipped);
        };
        let recipient = details.order.customer.email.trim();
        if recipient.is_empty() || !recipient.contains('@') {
            return Err(NotifierError::InvalidRecipient(recipient.to_string()));
        }
        let mut message = self.render_confirmation(details, !attachments.is_empty())?;
        message.attachments = attachments;
        transport.send(message).await?;
        info!("✉️ Confirmation email for order {} sent to {recipient}", details.order.order_id);
        Ok(DeliveryStatus::Sent)
    }
}
