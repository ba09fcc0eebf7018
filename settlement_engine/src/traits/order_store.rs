use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderDetails, OrderId, PaymentSettlement};

/// The persistent record of orders for the storefront.
///
/// Implementations must guarantee that [`try_mark_order_settled`](OrderStore::try_mark_order_settled) is atomic. Of
/// any number of concurrent calls for the same order, exactly one may observe the unpaid→paid transition.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new, unpaid order and its line items in a single atomic transaction. The next order number is
    /// assigned as part of the same write.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Fetches the order, its items, and a snapshot of every product that still exists in the catalog.
    async fn fetch_order_details(&self, order_id: &OrderId) -> Result<Option<OrderDetails>, OrderStoreError>;

    /// Returns all unpaid orders placed with the given email address, most recent first. The comparison is
    /// case-insensitive.
    async fn fetch_unpaid_orders_for_email(&self, email: &str) -> Result<Vec<Order>, OrderStoreError>;

    /// Sets `is_paid` and `notification_sent` and records the settlement details, if and only if the order has not
    /// been settled before.
    ///
    /// Returns the updated order if this call performed the transition, or `None` if there was no transition (the
    /// order was already settled, or does not exist).
    async fn try_mark_order_settled(
        &self,
        order_id: &OrderId,
        settlement: &PaymentSettlement,
    ) -> Result<Option<Order>, OrderStoreError>;

    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot insert an order without any items")]
    EmptyOrder,
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
