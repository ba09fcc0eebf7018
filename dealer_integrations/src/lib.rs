//! HTTP clients for the third-party services the storefront talks to: Stripe, PayPal, and a transactional mail API.
//!
//! Nothing in this crate knows about orders or settlement. The server wires these clients into the settlement
//! engine's traits.
mod config;
mod error;
mod helpers;

pub mod mail;
pub mod paypal;
pub mod stripe;

pub use config::{MailConfig, PaypalConfig, StripeConfig};
pub use error::{IntegrationError, WebhookVerificationError};
pub use helpers::parse_decimal_amount;
