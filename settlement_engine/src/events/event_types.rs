use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentMethod};

/// Published exactly once per order, right after the unpaid→paid transition has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order: Order,
    pub method: PaymentMethod,
}

impl OrderSettledEvent {
    pub fn new(order: Order, method: PaymentMethod) -> Self {
        Self { order, method }
    }
}

/// Published when an order was settled but the invoice or confirmation email could not be delivered. The order is
/// paid and its `notification_sent` flag is set, so nothing else will retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFailedEvent {
    pub order: Order,
    pub reason: String,
}

impl NotificationFailedEvent {
    pub fn new<S: Into<String>>(order: Order, reason: S) -> Self {
        Self { order, reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderSettled(OrderSettledEvent),
    NotificationFailed(NotificationFailedEvent),
}
