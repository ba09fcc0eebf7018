//! PayPal webhooks. PayPal signs its deliveries with a certificate chain; rather than validate that chain locally,
//! [`PaypalApi::verify_webhook_signature`] asks PayPal's own verification endpoint.
mod api;
mod data_objects;

pub use api::{PaypalApi, PaypalWebhookHeaders};
pub use data_objects::{
    PaypalAmount,
    PaypalCapture,
    PaypalEventKind,
    PaypalOrder,
    PaypalPayer,
    PaypalPayment,
    PaypalPaymentStatus,
    PaypalPurchaseUnit,
    PaypalWebhookEvent,
};
