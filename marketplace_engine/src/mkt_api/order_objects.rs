use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatus},
    traits::OrderFlowError,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub product_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatus>>,
}

impl OrderQueryFilter {
    pub fn since<T>(mut self, since: T) -> Result<Self, OrderFlowError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| OrderFlowError::ValidationError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, OrderFlowError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| OrderFlowError::ValidationError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_product_id(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.seller_id.is_none() &&
            self.product_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(buyer_id) = &self.buyer_id {
            write!(f, "buyer_id: {buyer_id}. ")?;
        }
        if let Some(seller_id) = &self.seller_id {
            write!(f, "seller_id: {seller_id}. ")?;
        }
        if let Some(product_id) = &self.product_id {
            write!(f, "product_id: {product_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// The buyer's claim that funds were sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReport {
    pub tx_hash: String,
    pub payer_address: Option<String>,
    pub note: Option<String>,
}

impl PaymentReport {
    pub fn new<S: Into<String>>(tx_hash: S) -> Self {
        Self { tx_hash: tx_hash.into(), payer_address: None, note: None }
    }

    pub fn with_payer_address<S: Into<String>>(mut self, address: S) -> Self {
        self.payer_address = Some(address.into());
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A conditional status change. The backend applies it only if the order is currently in one of the `from` states,
/// and records `actor_id` and `note` in the status log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTransition {
    pub from: Vec<OrderStatus>,
    pub to: OrderStatus,
    pub actor_id: Option<i64>,
    pub note: Option<String>,
    /// Only used when moving to `PaidReported`
    pub payment: Option<PaymentReport>,
    /// Only used when moving to `Cancelled`
    pub cancel_reason: Option<String>,
}

impl OrderTransition {
    pub fn new(from: &[OrderStatus], to: OrderStatus) -> Self {
        Self { from: from.to_vec(), to, actor_id: None, note: None, payment: None, cancel_reason: None }
    }

    pub fn by(mut self, actor_id: Option<i64>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_payment(mut self, payment: PaymentReport) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn with_cancel_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.cancel_reason = Some(reason.into());
        self
    }
}

/// The result of a purchase request. `created` is false when an open order for the same product already existed and
/// was returned instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderResult {
    pub order: Order,
    pub created: bool,
}

impl NewOrderResult {
    pub fn new(order: Order, created: bool) -> Self {
        Self { order, created }
    }
}

/// Which side of an order the caller wants to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRole {
    Buyer,
    Seller,
}
