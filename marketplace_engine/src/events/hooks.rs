use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
    ProductReviewedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub product_reviewed_producer: Vec<EventProducer<ProductReviewedEvent>>,
}

impl EventProducers {
    pub async fn publish_order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        for producer in &self.order_status_changed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_product_reviewed(&self, event: ProductReviewedEvent) {
        for producer in &self.product_reviewed_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_product_reviewed: Option<EventHandler<ProductReviewedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_product_reviewed = hooks.on_product_reviewed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_status_changed, on_product_reviewed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_product_reviewed {
            result.product_reviewed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_product_reviewed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_product_reviewed: Option<Handler<ProductReviewedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_product_reviewed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ProductReviewedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_product_reviewed = Some(Arc::new(f));
        self
    }
}
