use std::fmt::Debug;

use dealer_common::DEFAULT_CURRENCY_CODE;
use log::*;

use crate::{
    db_types::{NewOrder, NewOrderItem, NewProduct, Order, OrderDetails, OrderId, Product, ProductId},
    engine_api::{errors::OrderApiError, order_objects::NewOrderRequest},
    traits::{OrderStore, ProductCatalog},
};

/// The most units of a single product that one order may contain.
pub const MAX_ITEM_QUANTITY: i64 = 100;

/// `OrderApi` turns checkout submissions into pending orders, and reads orders back.
pub struct OrderApi<B> {
    db: B,
    currency: String,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi ({})", self.currency)
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B, currency: &str) -> Self {
        let currency = match currency.trim() {
            "" => DEFAULT_CURRENCY_CODE.to_string(),
            c => c.to_ascii_lowercase(),
        };
        Self { db, currency }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl<B> OrderApi<B>
where B: OrderStore + ProductCatalog
{
    /// Creates a new unpaid order. Each item is priced from the catalog at the moment the order is placed; the price
    /// and product name are copied onto the item so that later catalog changes do not alter the order.
    pub async fn place_order(&self, request: NewOrderRequest) -> Result<Order, OrderApiError> {
        let email = request.customer.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(OrderApiError::InvalidEmail);
        }
        if request.items.is_empty() {
            return Err(OrderApiError::EmptyOrder);
        }
        let currency = request.currency.as_deref().unwrap_or(&self.currency);
        let mut customer = request.customer.clone();
        customer.email = email.to_string();
        let mut order = NewOrder::new(customer, currency);
        if let Some(method) = request.payment_method {
            order = order.with_payment_method(method);
        }
        for item in request.items {
            if !(1..=MAX_ITEM_QUANTITY).contains(&item.quantity) {
                return Err(OrderApiError::InvalidQuantity(item.product_id, item.quantity));
            }
            let product = self
                .db
                .fetch_product(&item.product_id)
                .await?
                .ok_or_else(|| OrderApiError::ProductNotFound(item.product_id.clone()))?;
            order = order.with_item(NewOrderItem::new(product.product_id, product.title, item.quantity, product.price));
        }
        if order.checked_total_price().is_none() {
            warn!("📝️ Rejecting order {} for {}. The total overflows.", order.order_id, order.customer.email);
            return Err(OrderApiError::TotalOutOfRange);
        }
        let order = self.db.insert_order(order).await?;
        info!("📝️ Order #{} ({}) placed for {}", order.order_number, order.order_id, order.total_price);
        Ok(order)
    }

    pub async fn fetch_order_details(&self, order_id: &OrderId) -> Result<OrderDetails, OrderApiError> {
        self.db.fetch_order_details(order_id).await?.ok_or_else(|| OrderApiError::OrderNotFound(order_id.clone()))
    }

    pub async fn upsert_product(&self, product: NewProduct) -> Result<Product, OrderApiError> {
        Ok(self.db.upsert_product(product).await?)
    }

    pub async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, OrderApiError> {
        Ok(self.db.fetch_product(product_id).await?)
    }
}
