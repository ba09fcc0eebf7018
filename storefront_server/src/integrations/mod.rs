//! Glue between the provider clients in `dealer_integrations` and the settlement engine's traits.
pub mod event_hooks;
pub mod mail;
pub mod paypal;
pub mod stripe;

use thiserror::Error;

/// A webhook payload that claims to be a payment event but cannot be turned into a payment signal.
#[derive(Debug, Error)]
pub enum SignalConversionError {
    #[error("The webhook payload is malformed. {0}")]
    FormatError(String),
    #[error("Invalid payment amount. {0}")]
    InvalidAmount(String),
}
