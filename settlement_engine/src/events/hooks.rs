use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, NotificationFailedEvent, OrderSettledEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_settled_producer: Vec<EventProducer<OrderSettledEvent>>,
    pub notification_failed_producer: Vec<EventProducer<NotificationFailedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_settled(&self, event: OrderSettledEvent) {
        for producer in &self.order_settled_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_notification_failed(&self, event: NotificationFailedEvent) {
        for producer in &self.notification_failed_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_settled: Option<EventHandler<OrderSettledEvent>>,
    pub on_notification_failed: Option<EventHandler<NotificationFailedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_settled = hooks.on_order_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_notification_failed = hooks.on_notification_failed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_settled, on_notification_failed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_settled {
            result.order_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_notification_failed {
            result.notification_failed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_notification_failed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_settled: Option<Handler<OrderSettledEvent>>,
    pub on_notification_failed: Option<Handler<NotificationFailedEvent>>,
}

impl EventHooks {
    pub fn on_order_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_settled = Some(Arc::new(f));
        self
    }

    pub fn on_notification_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NotificationFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notification_failed = Some(Arc::new(f));
        self
    }
}
