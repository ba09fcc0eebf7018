use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, PaymentSettlement},
    traits::OrderStoreError,
};

/// Inserts a new order and its items using the given connection. This is not atomic. Embed the call inside a
/// transaction and pass `&mut *tx` as the connection argument.
///
/// The order number is derived from the current maximum inside the INSERT statement itself, so that two concurrent
/// inserts can never be handed the same number. The first order gets number 1001.
///
/// The INSERT must be the first statement in the transaction so that the write lock is taken up front. An existing
/// `order_id` surfaces as a unique violation.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    if order.items.is_empty() {
        return Err(OrderStoreError::EmptyOrder);
    }
    let order_id = order.order_id.clone();
    let total_price = order.total_price();
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                order_number,
                customer_name,
                customer_email,
                customer_phone,
                customer_address,
                payment_method,
                total_price,
                currency
            ) VALUES ($1, (SELECT COALESCE(MAX(order_number), 1000) + 1 FROM orders), $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(order.customer.name)
    .bind(order.customer.email)
    .bind(order.customer.phone)
    .bind(order.customer.address)
    .bind(order.payment_method)
    .bind(total_price.value())
    .bind(order.currency)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => OrderStoreError::OrderAlreadyExists(order_id),
        e => OrderStoreError::from(e),
    })?;
    for item in order.items {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5);
            "#,
        )
        .bind(inserted.order_id.as_str())
        .bind(item.product_id.as_str())
        .bind(item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price.value())
        .execute(&mut *conn)
        .await?;
    }
    debug!("📝️ Order {} inserted with number #{}", inserted.order_id, inserted.order_number);
    Ok(inserted)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the line items of the order in the order they were added.
pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Unpaid orders for the email address, most recent first.
pub async fn fetch_unpaid_orders_for_email(email: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE lower(customer_email) = lower($1) AND is_paid = 0
            ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(email.trim())
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// The compare-and-set at the heart of the settlement flow.
///
/// Both flags are set in one statement, guarded by `notification_sent = 0`. SQLite serialises writers, so of any
/// number of concurrent callers exactly one gets a row back.
pub async fn mark_order_settled(
    order_id: &OrderId,
    settlement: &PaymentSettlement,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                is_paid = 1,
                notification_sent = 1,
                payment_method = $1,
                payment_reference = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND notification_sent = 0
            RETURNING *;
        "#,
    )
    .bind(settlement.method)
    .bind(settlement.reference.as_str())
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    match &order {
        Some(o) => debug!("📝️ Order {} marked as paid via {}", o.order_id, settlement.method),
        None => trace!("📝️ Order {order_id} was not transitioned. It is already settled or does not exist"),
    }
    Ok(order)
}
