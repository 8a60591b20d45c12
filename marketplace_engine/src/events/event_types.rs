use serde::{Deserialize, Serialize};

use crate::db_types::{Actor, Order, OrderStatus, Product};

/// A buyer placed a new order. Not fired when an existing open order is returned instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired after every committed order status change, including expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatus,
    pub order: Order,
    pub actor: Actor,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatus, order: Order, actor: Actor) -> Self {
        Self { old_status, order, actor }
    }

    pub fn new_status(&self) -> OrderStatus {
        self.order.status
    }
}

/// An admin approved or rejected a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReviewedEvent {
    pub product: Product,
    pub reviewer_id: i64,
    pub approved: bool,
}

impl ProductReviewedEvent {
    pub fn new(product: Product, reviewer_id: i64, approved: bool) -> Self {
        Self { product, reviewer_id, approved }
    }
}
