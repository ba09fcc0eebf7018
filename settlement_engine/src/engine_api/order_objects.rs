use serde::{Deserialize, Serialize};

use crate::db_types::{CustomerContact, PaymentMethod, ProductId};

/// A customer's checkout submission. Prices are never taken from the client; they are copied from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub customer: CustomerContact,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

impl OrderItemRequest {
    pub fn new<P: Into<ProductId>>(product_id: P, quantity: i64) -> Self {
        Self { product_id: product_id.into(), quantity }
    }
}
