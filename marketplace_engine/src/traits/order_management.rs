use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{DeliveryRecord, Order, OrderStatus, OrderStatusLogEntry},
    mkt_api::{
        account_objects::Pagination,
        order_objects::{NewOrderResult, OrderQueryFilter, OrderTransition},
    },
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("This product is not for sale")]
    ProductNotForSale,
    #[error("You cannot buy your own product")]
    CannotBuyOwnProduct,
    #[error("You have already purchased this product (order {0})")]
    AlreadyPurchased(i64),
    #[error("The seller has not set up a wallet address and cannot receive payments yet")]
    SellerHasNoWallet,
    #[error("You are not allowed to perform this action on the order")]
    Forbidden,
    #[error("An order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("This transaction hash has already been reported for another order")]
    DuplicateTxHash,
    #[error("Delivery is only available for completed orders. This order is {0}")]
    DeliveryNotAvailable(OrderStatus),
    #[error("{0}")]
    ValidationError(String),
    #[error("The order was modified by someone else. Please try again.")]
    Conflict,
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// The `OrderManagement` trait defines behaviour for storing orders and moving them through their lifecycle.
///
/// Every status change is recorded in the order's audit trail by the backend.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Places an order for `product_id` on behalf of `buyer_id`, in a single atomic transaction.
    ///
    /// * The listing must exist ([`OrderFlowError::ProductNotFound`]) and be `approved`
    ///   ([`OrderFlowError::ProductNotForSale`]).
    /// * The buyer may not be the seller ([`OrderFlowError::CannotBuyOwnProduct`]).
    /// * A buyer that already completed a purchase of the product gets [`OrderFlowError::AlreadyPurchased`].
    /// * If the buyer already has an open order for the product, that order is returned and `created` is false.
    /// * The seller must have a wallet address ([`OrderFlowError::SellerHasNoWallet`]).
    ///
    /// The title, price, currency, delivery type and seller wallet are copied onto the order.
    async fn insert_order_for_product(&self, buyer_id: i64, product_id: i64) -> Result<NewOrderResult, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Applies the status change if, and only if, the order is currently in one of `transition.from`.
    /// The relevant timestamp column, payment fields and cancellation fields are updated alongside the status.
    ///
    /// Returns `None` if the order was not in one of the expected states.
    /// A transaction hash that is already attached to another order results in [`OrderFlowError::DuplicateTxHash`].
    async fn transition_order(
        &self,
        order_id: i64,
        transition: OrderTransition,
    ) -> Result<Option<Order>, OrderFlowError>;

    /// Orders matching the filter, newest first.
    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderFlowError>;

    /// The audit trail for the order, oldest entry first.
    async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<OrderStatusLogEntry>, OrderFlowError>;

    /// The delivery details for the order, read from the listing and the seller's profile.
    async fn fetch_delivery(&self, order_id: i64) -> Result<Option<DeliveryRecord>, OrderFlowError>;

    /// Cancels every `created` order that has not been touched for longer than `unpaid_limit`.
    /// Orders that already have a reported payment are never expired.
    ///
    /// The result is the list of orders that were cancelled.
    async fn expire_orders(&self, unpaid_limit: Duration, reason: &str) -> Result<Vec<Order>, OrderFlowError>;
}
