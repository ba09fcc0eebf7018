//! # Settlement engine public API
//!
//! The `engine_api` module exposes the programmatic API of the settlement engine.
//!
//! * [`settlement_flow_api`] is the settlement coordinator. It resolves payment-completion signals to orders, performs
//!   the guarded unpaid→paid transition, and sends the invoice exactly once per transition.
//! * [`order_api`] places new orders against the product catalog, and fetches orders with their line items.
//!
//! # API usage
//!
//! An API instance is created by supplying the backends it needs.
//!
//! ```rust,ignore
//! use settlement_engine::{OrderApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderStore and ProductCatalog
//! let api = OrderApi::new(db, "usd");
//! let details = api.fetch_order_details(&order_id).await?;
//! ```
pub mod errors;
pub mod order_api;
pub mod order_objects;
pub mod settlement_flow_api;
pub mod settlement_objects;
