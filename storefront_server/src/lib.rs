//! # Dealership storefront server
//! This crate hosts the HTTP server for the dealership storefront. It is responsible for:
//! * Accepting new orders from the storefront front end, priced from the catalog.
//! * Opening Stripe checkout sessions, and confirming them when the customer is redirected back.
//! * Receiving payment webhooks from Stripe and PayPal, and passing them to the settlement engine, which marks the
//!   order as paid exactly once and emails the customer an invoice.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/orders`, `GET /api/orders/{order_id}`: Place and look up orders.
//! * `POST /checkout/stripe/{order_id}`: Open a Stripe checkout session for an unpaid order.
//! * `GET /checkout/confirm?session_id=..&order_id=..`: The Stripe redirect target.
//! * `POST /webhooks/stripe`, `POST /webhooks/paypal`: Signed payment webhooks.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
