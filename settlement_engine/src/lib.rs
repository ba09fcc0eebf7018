//! Dealership storefront settlement engine
//!
//! This library contains the core logic for settling storefront orders against payment provider notifications. It is
//! provider-agnostic; the Stripe and PayPal clients live in `dealer_integrations`.
//!
//! The library is divided into these main sections:
//! 1. The data types stored in the database ([`mod@db_types`]), and the backend contracts ([`mod@traits`]) that a
//!    store, catalog or payment provider has to satisfy. [`SqliteDatabase`] is the bundled store.
//! 2. The public API ([`mod@engine_api`]). [`SettlementApi`] resolves payment signals to orders and performs the
//!    exactly-once unpaid→paid transition. [`OrderApi`] places new orders against the catalog.
//! 3. Invoice generation ([`mod@documents`]) and customer notification ([`mod@notifications`]).
//!
//! The engine also publishes events ([`mod@events`]) after an order is settled, or when the customer could not be
//! notified. Hook into these to perform custom actions, such as queueing a resend.
pub mod db_types;
pub mod documents;
mod engine_api;
pub mod events;
pub mod notifications;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use engine_api::{
    errors::{OrderApiError, SettlementError},
    order_api::OrderApi,
    order_objects,
    settlement_flow_api::SettlementApi,
    settlement_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{OrderStore, OrderStoreError, ProductCatalog};
