use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use dealer_common::Cents;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh, unguessable order identifier.
    pub fn random() -> Self {
        Self(format!("ord_{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

//--------------------------------------       ProductId       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
/// The payment processor that settled (or will settle) an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card payments through a redirect checkout session.
    Stripe,
    /// Wallet payments, confirmed by server-to-server webhooks.
    Paypal,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Stripe => write!(f, "stripe"),
            PaymentMethod::Paypal => write!(f, "paypal"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid payment method: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stripe" => Ok(Self::Stripe),
            "paypal" => Ok(Self::Paypal),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    CustomerContact    ---------------------------------------------------------
/// The contact details captured at checkout. Only the email address is needed by the settlement flow.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CustomerContact {
    #[sqlx(rename = "customer_name")]
    pub name: String,
    #[sqlx(rename = "customer_email")]
    pub email: String,
    #[sqlx(rename = "customer_phone")]
    #[serde(default)]
    pub phone: Option<String>,
    #[sqlx(rename = "customer_address")]
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerContact {
    pub fn new<S: Into<String>>(name: S, email: S) -> Self {
        Self { name: name.into(), email: email.into(), phone: None, address: None }
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = Some(address.into());
        self
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// Human-friendly, strictly increasing number printed on invoices.
    pub order_number: i64,
    #[sqlx(flatten)]
    pub customer: CustomerContact,
    pub payment_method: Option<PaymentMethod>,
    /// The provider-side identifier (checkout session, capture id) that settled this order.
    pub payment_reference: Option<String>,
    pub total_price: Cents,
    pub currency: String,
    pub is_paid: bool,
    /// Idempotency guard. Set in the same write that sets `is_paid`.
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_settled(&self) -> bool {
        self.is_paid && self.notification_sent
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    /// Weak reference. The product may since have been modified or removed from the catalog.
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl OrderItem {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer: CustomerContact,
    pub currency: String,
    /// The processor the customer chose at checkout, if known.
    pub payment_method: Option<PaymentMethod>,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn new(customer: CustomerContact, currency: &str) -> Self {
        Self {
            order_id: OrderId::random(),
            customer,
            currency: currency.to_ascii_lowercase(),
            payment_method: None,
            items: Vec::new(),
        }
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn total_price(&self) -> Cents {
        self.items.iter().map(|i| i.unit_price * i.quantity).sum()
    }

    /// The order total, or `None` if any line or the sum overflows.
    pub fn checked_total_price(&self) -> Option<Cents> {
        self.items
            .iter()
            .try_fold(Cents::default(), |total, i| i.unit_price.checked_mul(i.quantity).and_then(|l| total.checked_add(l)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl NewOrderItem {
    pub fn new<P: Into<ProductId>, S: Into<String>>(product_id: P, name: S, quantity: i64, unit_price: Cents) -> Self {
        Self { product_id: product_id.into(), product_name: name.into(), quantity, unit_price }
    }
}

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_id: ProductId,
    pub title: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub fuel_type: Option<String>,
    pub price: Cents,
    pub images: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_id: ProductId,
    pub title: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub fuel_type: Option<String>,
    pub price: Cents,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewProduct {
    pub fn new<P: Into<ProductId>, S: Into<String>>(product_id: P, title: S, price: Cents) -> Self {
        Self { product_id: product_id.into(), title: title.into(), price, ..Default::default() }
    }
}

//--------------------------------------    ProductSnapshot    ---------------------------------------------------------
/// The vehicle attributes printed on an invoice. Every attribute is optional; the catalog is not required to know
/// the mileage of a gift card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub title: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub color: Option<String>,
    pub mileage: Option<i64>,
    pub fuel_type: Option<String>,
    pub price: Cents,
    pub images: Vec<String>,
}

impl From<Product> for ProductSnapshot {
    fn from(p: Product) -> Self {
        Self {
            title: p.title,
            make: p.make,
            model: p.model,
            year: p.year,
            color: p.color,
            mileage: p.mileage,
            fuel_type: p.fuel_type,
            price: p.price,
            images: p.images.0,
        }
    }
}

//--------------------------------------      OrderDetails     ---------------------------------------------------------
/// An order hydrated with its items and, where the product still exists, a snapshot of the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: Option<ProductSnapshot>,
}

impl OrderDetails {
    pub fn subtotal(&self) -> Cents {
        self.lines.iter().map(|l| l.item.line_total()).sum()
    }
}

//--------------------------------------   PaymentSettlement   ---------------------------------------------------------
/// What gets recorded on an order when it is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettlement {
    pub method: PaymentMethod,
    pub reference: String,
}

impl PaymentSettlement {
    pub fn new<S: Into<String>>(method: PaymentMethod, reference: S) -> Self {
        Self { method, reference: reference.into() }
    }
}
