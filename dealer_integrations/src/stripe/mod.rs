//! Stripe Checkout: session retrieval and creation, and webhook signature verification.
mod api;
mod data_objects;
mod signature;

pub use api::StripeApi;
pub use data_objects::{
    CheckoutLineItem,
    NewCheckoutSession,
    StripeCheckoutSession,
    StripeCustomerDetails,
    StripeEvent,
    StripeEventData,
    StripeEventKind,
    ORDER_ID_METADATA_KEY,
};
pub use signature::{StripeSignatureVerifier, STRIPE_SIGNATURE_HEADER};
