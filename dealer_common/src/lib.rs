//! Types shared by every crate in the dealership storefront workspace.
mod cents;

pub mod helpers;
pub mod op;
mod secret;

pub use cents::{Cents, CentsConversionError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
