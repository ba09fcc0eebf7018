use std::{future::Future, pin::Pin};

use log::*;
use settlement_engine::events::{EventHandlers, EventHooks, NotificationFailedEvent, OrderSettledEvent};

pub const SETTLEMENT_EVENT_BUFFER_SIZE: usize = 25;

/// Creates the server's settlement event handlers.
///
/// 1. OrderSettledEvent - logged at info level, for the audit trail.
/// 2. NotificationFailedEvent - logged at error level. The order is paid, but the customer has not received an invoice
///    and someone needs to resend it.
pub fn create_settlement_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_settled(|ev: OrderSettledEvent| {
        Box::pin(async move {
            let order = ev.order;
            info!(
                "📬️ Order #{} {} settled via {}. {} {} paid by {}",
                order.order_number,
                order.order_id,
                ev.method,
                order.total_price,
                order.currency.to_ascii_uppercase(),
                order.customer.email
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks.on_notification_failed(|ev: NotificationFailedEvent| {
        Box::pin(async move {
            error!(
                "📬️ RESEND NEEDED: order #{} {} is paid, but {} was not notified. {}",
                ev.order.order_number, ev.order.order_id, ev.order.customer.email, ev.reason
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    EventHandlers::new(SETTLEMENT_EVENT_BUFFER_SIZE, hooks)
}
