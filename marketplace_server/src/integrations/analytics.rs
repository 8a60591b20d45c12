use futures::future::BoxFuture;
use log::*;
use marketplace_engine::{
    db_types::OrderStatus,
    events::{EventHandlers, EventHooks, OrderStatusChangedEvent},
    mkt_api::analytics_objects::NewAnalyticsEvent,
    AnalyticsApi,
    SqliteDatabase,
};
use serde_json::json;

pub const ANALYTICS_EVENT_BUFFER_SIZE: usize = 50;

/// Assigns event handlers that record marketplace activity as analytics events.
///
/// The following events are recorded:
///
/// 1. `order_created` when a buyer places a new order (not when an open order is returned again).
/// 2. `order_completed` when an order reaches `completed`.
/// 3. `order_cancelled` when an order is cancelled by a user, an admin or the expiry worker.
/// 4. `product_reviewed` when an admin approves or rejects a listing.
pub fn create_analytics_event_handlers(db: SqliteDatabase) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let api = AnalyticsApi::new(db);
    // --- On OrderCreated Handler ---
    let api_clone = api.clone();
    hooks.on_order_created(move |ev| {
        let order = ev.order;
        let event = NewAnalyticsEvent::new("order_created").with_user_id(Some(order.buyer_id)).with_properties(json!({
            "order_id": order.id,
            "product_id": order.product_id,
            "seller_id": order.seller_id,
            "amount": order.amount,
            "currency": order.currency,
        }));
        record(api_clone.clone(), event)
    });
    // --- On OrderStatusChanged Handler ---
    let api_clone = api.clone();
    hooks.on_order_status_changed(move |ev| match status_change_event(&ev) {
        Some(event) => record(api_clone.clone(), event),
        None => no_op(),
    });
    // --- On ProductReviewed Handler ---
    hooks.on_product_reviewed(move |ev| {
        let event = NewAnalyticsEvent::new("product_reviewed").with_user_id(Some(ev.reviewer_id)).with_properties(
            json!({
                "product_id": ev.product.id,
                "seller_id": ev.product.seller_id,
                "approved": ev.approved,
            }),
        );
        record(api.clone(), event)
    });
    EventHandlers::new(ANALYTICS_EVENT_BUFFER_SIZE, hooks)
}

/// Only completions and cancellations are tracked. Other status changes are already visible in the order log.
fn status_change_event(ev: &OrderStatusChangedEvent) -> Option<NewAnalyticsEvent> {
    let order = &ev.order;
    match order.status {
        OrderStatus::Completed => {
            let event = NewAnalyticsEvent::new("order_completed").with_user_id(Some(order.buyer_id)).with_properties(
                json!({
                    "order_id": order.id,
                    "product_id": order.product_id,
                    "seller_id": order.seller_id,
                    "amount": order.amount,
                    "currency": order.currency,
                }),
            );
            Some(event)
        },
        OrderStatus::Cancelled => {
            let event = NewAnalyticsEvent::new("order_cancelled").with_user_id(ev.actor.user_id).with_properties(json!({
                "order_id": order.id,
                "product_id": order.product_id,
                "from_status": ev.old_status,
                "reason": order.cancel_reason,
                "actor": ev.actor.to_string(),
            }));
            Some(event)
        },
        _ => None,
    }
}

fn record(api: AnalyticsApi<SqliteDatabase>, event: NewAnalyticsEvent) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let name = event.name.clone();
        match api.record_event(event).await {
            Ok(ev) => trace!("📊️ Recorded '{name}' event #{}", ev.id),
            Err(e) => error!("📊️ Could not record '{name}' event. {e}"),
        }
    })
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
