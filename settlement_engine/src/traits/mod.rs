//! # Backend contracts
//!
//! This module defines the interfaces that the settlement engine needs from the outside world.
//!
//! * [`OrderStore`] is the persistent record of orders and their line items. Its
//!   [`try_mark_order_settled`](OrderStore::try_mark_order_settled) method is the single serialisation point of the
//!   settlement flow: a compare-and-set on the `notification_sent` flag.
//! * [`ProductCatalog`] stores the vehicles (and anything else) the dealership sells. Settlement only ever reads it.
//! * [`CheckoutSessions`] abstracts over a redirect-checkout payment provider.
//!
//! The document generator and notifier contracts live in [`crate::documents`] and [`crate::notifications`].
mod checkout_sessions;
mod order_store;
mod product_catalog;

pub use checkout_sessions::{CheckoutSession, CheckoutSessions, CheckoutUrls, PaymentProviderError, SessionPaymentStatus};
pub use order_store::{OrderStore, OrderStoreError};
pub use product_catalog::ProductCatalog;
