//! The order lifecycle.
//!
//! Payment happens off-platform: the buyer sends funds to the seller's wallet, reports the transaction hash, and the
//! seller confirms receipt. Confirmation unlocks delivery straight away.
//!
//! | from \ to     | paid_reported  | confirmed      | completed      | cancelled                       |
//! |---------------|----------------|----------------|----------------|---------------------------------|
//! | created       | buyer          | -              | -              | buyer / seller / admin / system |
//! | paid_reported | same tx: no-op | seller / admin | -              | seller / admin                  |
//! | confirmed     | -              | no-op          | system / admin | admin                           |
//! | completed     | -              | no-op          | no-op          | -                               |
//! | cancelled     | -              | -              | -              | no-op                           |
//!
//! Every change is a conditional update on the current status, so two actors racing on the same order cannot both
//! win. Events are published only after the change has been committed.
use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{Actor, Delivery, Order, OrderStatus, OrderStatusLogEntry},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    helpers::{check_length, validate_tx_hash, ValidationError},
    mkt_api::{
        account_objects::Pagination,
        order_objects::{NewOrderResult, OrderQueryFilter, OrderTransition, PaymentReport},
    },
    traits::{OrderFlowError, OrderManagement},
};

pub const EXPIRY_REASON: &str = "expired: payment not reported in time";
const AUTO_COMPLETE_NOTE: &str = "auto-completed after payment confirmation";
const MAX_REASON_LENGTH: usize = 500;

/// `OrderFlowApi` is the primary API for moving orders through their lifecycle.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl From<ValidationError> for OrderFlowError {
    fn from(e: ValidationError) -> Self {
        OrderFlowError::ValidationError(e.to_string())
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    async fn call_order_created_hook(&self, order: &Order) {
        trace!("🛒️ Notifying order created hook subscribers");
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
    }

    async fn call_status_changed_hook(&self, old_status: OrderStatus, order: &Order, actor: Actor) {
        trace!("🛒️ Notifying order status hook subscribers");
        let event = OrderStatusChangedEvent::new(old_status, order.clone(), actor);
        self.producers.publish_order_status_changed(event).await;
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Places an order for an approved listing.
    ///
    /// If the buyer already has an open order for the listing, that order is returned with `created == false` and no
    /// event is published.
    pub async fn create_order(&self, buyer_id: i64, product_id: i64) -> Result<NewOrderResult, OrderFlowError> {
        let result = self.db.insert_order_for_product(buyer_id, product_id).await?;
        if result.created {
            info!("🛒️ Order #{} created: buyer #{buyer_id}, product #{product_id}", result.order.id);
            self.call_order_created_hook(&result.order).await;
        } else {
            debug!("🛒️ Buyer #{buyer_id} already has order #{} for product #{product_id}", result.order.id);
        }
        Ok(result)
    }

    /// The buyer reports that funds were sent. Reporting the same transaction hash again is a no-op.
    pub async fn report_payment(
        &self,
        buyer_id: i64,
        order_id: i64,
        payment: PaymentReport,
    ) -> Result<Order, OrderFlowError> {
        let payment = normalize_payment(payment)?;
        let actor = Actor::user(buyer_id);
        let order = self.visible_order(&actor, order_id).await?;
        if order.buyer_id != buyer_id {
            return Err(OrderFlowError::Forbidden);
        }
        if is_same_report(&order, &payment) {
            debug!("🛒️ Payment for order #{order_id} was already reported with this hash");
            return Ok(order);
        }
        if order.status != OrderStatus::Created {
            return Err(OrderFlowError::IllegalTransition { from: order.status, to: OrderStatus::PaidReported });
        }
        let transition = OrderTransition::new(&[OrderStatus::Created], OrderStatus::PaidReported)
            .by(Some(buyer_id))
            .with_payment(payment.clone());
        match self.db.transition_order(order_id, transition).await? {
            Some(updated) => {
                info!("🛒️ Payment reported for order #{order_id} (tx {})", payment.tx_hash);
                self.call_status_changed_hook(order.status, &updated, actor).await;
                Ok(updated)
            },
            None => {
                let current = self.fetch(order_id).await?;
                if is_same_report(&current, &payment) {
                    Ok(current)
                } else {
                    Err(miss(&current, &[OrderStatus::Created], OrderStatus::PaidReported))
                }
            },
        }
    }

    /// The seller (or an admin) confirms that the funds arrived. The order is completed in the same call, which
    /// releases the delivery to the buyer.
    ///
    /// Confirming an order that is already confirmed finishes the completion step. Confirming a completed order is a
    /// no-op.
    pub async fn confirm_payment(&self, actor: Actor, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.visible_order(&actor, order_id).await?;
        if !actor.is_admin && !actor.is(order.seller_id) {
            return Err(OrderFlowError::Forbidden);
        }
        match order.status {
            OrderStatus::Completed => Ok(order),
            OrderStatus::Confirmed => self.complete(order, Actor::system(), AUTO_COMPLETE_NOTE).await,
            OrderStatus::PaidReported => {
                let transition = OrderTransition::new(&[OrderStatus::PaidReported], OrderStatus::Confirmed)
                    .by(actor.user_id)
                    .with_note(format!("payment confirmed by {actor}"));
                let confirmed = match self.db.transition_order(order_id, transition).await? {
                    Some(o) => o,
                    None => {
                        let current = self.fetch(order_id).await?;
                        return match current.status {
                            OrderStatus::Completed => Ok(current),
                            OrderStatus::Confirmed => self.complete(current, Actor::system(), AUTO_COMPLETE_NOTE).await,
                            _ => Err(miss(&current, &[OrderStatus::PaidReported], OrderStatus::Confirmed)),
                        };
                    },
                };
                info!("🛒️ Payment for order #{order_id} confirmed by {actor}");
                self.call_status_changed_hook(OrderStatus::PaidReported, &confirmed, actor).await;
                self.complete(confirmed, Actor::system(), AUTO_COMPLETE_NOTE).await
            },
            status => Err(OrderFlowError::IllegalTransition { from: status, to: OrderStatus::Confirmed }),
        }
    }

    /// Moves a confirmed order to completed. Only the system and admins may do this.
    pub async fn complete_order(&self, actor: Actor, order_id: i64) -> Result<Order, OrderFlowError> {
        if !actor.is_admin && !actor.is_system() {
            return Err(OrderFlowError::Forbidden);
        }
        let order = self.fetch(order_id).await?;
        match order.status {
            OrderStatus::Completed => Ok(order),
            OrderStatus::Confirmed => self.complete(order, actor, &format!("completed by {actor}")).await,
            status => Err(OrderFlowError::IllegalTransition { from: status, to: OrderStatus::Completed }),
        }
    }

    async fn complete(&self, order: Order, actor: Actor, note: &str) -> Result<Order, OrderFlowError> {
        let transition =
            OrderTransition::new(&[OrderStatus::Confirmed], OrderStatus::Completed).by(actor.user_id).with_note(note);
        match self.db.transition_order(order.id, transition).await? {
            Some(completed) => {
                info!("🛒️ Order #{} completed. Delivery is now available.", completed.id);
                self.call_status_changed_hook(OrderStatus::Confirmed, &completed, actor).await;
                Ok(completed)
            },
            None => {
                let current = self.fetch(order.id).await?;
                if current.status == OrderStatus::Completed {
                    Ok(current)
                } else {
                    Err(miss(&current, &[OrderStatus::Confirmed], OrderStatus::Completed))
                }
            },
        }
    }

    /// Cancels the order on behalf of `actor`.
    ///
    /// * buyers can cancel orders that have not been paid yet,
    /// * sellers can also cancel orders whose payment was reported but never arrived,
    /// * admins can additionally cancel confirmed orders.
    ///
    /// Cancelling a cancelled order is a no-op. Completed orders can never be cancelled, and confirmed orders are
    /// out of reach for everyone but admins.
    pub async fn cancel_order(
        &self,
        actor: Actor,
        order_id: i64,
        reason: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if let Some(r) = &reason {
            check_length("reason", r, 1, MAX_REASON_LENGTH)?;
        }
        let order = self.visible_order(&actor, order_id).await?;
        match order.status {
            OrderStatus::Cancelled => return Ok(order),
            OrderStatus::Completed => {
                return Err(OrderFlowError::IllegalTransition { from: order.status, to: OrderStatus::Cancelled })
            },
            // Confirmation completes the order right away, so only an admin can still step in
            OrderStatus::Confirmed if !actor.is_admin => {
                return Err(OrderFlowError::IllegalTransition { from: order.status, to: OrderStatus::Cancelled })
            },
            _ => {},
        }
        let (allowed, role) = if actor.is_admin {
            (OrderStatus::OPEN.to_vec(), "admin")
        } else if actor.is(order.seller_id) {
            (vec![OrderStatus::Created, OrderStatus::PaidReported], "seller")
        } else if actor.is_system() {
            (vec![OrderStatus::Created], "system")
        } else if actor.is(order.buyer_id) {
            (vec![OrderStatus::Created], "buyer")
        } else {
            return Err(OrderFlowError::Forbidden);
        };
        if !allowed.contains(&order.status) {
            return Err(OrderFlowError::Forbidden);
        }
        let reason = reason.unwrap_or_else(|| format!("cancelled by {role}"));
        let transition = OrderTransition::new(&allowed, OrderStatus::Cancelled)
            .by(actor.user_id)
            .with_note(reason.clone())
            .with_cancel_reason(reason);
        match self.db.transition_order(order_id, transition).await? {
            Some(cancelled) => {
                info!("🛒️ Order #{order_id} cancelled by {actor}");
                self.call_status_changed_hook(order.status, &cancelled, actor).await;
                Ok(cancelled)
            },
            None => {
                let current = self.fetch(order_id).await?;
                if current.status == OrderStatus::Cancelled {
                    Ok(current)
                } else {
                    Err(miss(&current, &allowed, OrderStatus::Cancelled))
                }
            },
        }
    }

    /// Cancels every `created` order that has not been touched for longer than `unpaid_limit`.
    ///
    /// The result is the list of orders that were expired.
    pub async fn expire_stale_orders(&self, unpaid_limit: Duration) -> Result<Vec<Order>, OrderFlowError> {
        let expired = self.db.expire_orders(unpaid_limit, EXPIRY_REASON).await?;
        for order in &expired {
            info!("🛒️ Order #{} expired", order.id);
            self.call_status_changed_hook(OrderStatus::Created, order, Actor::system()).await;
        }
        Ok(expired)
    }

    /// What the buyer paid for. Only available once the order is completed.
    pub async fn delivery(&self, actor: &Actor, order_id: i64) -> Result<Delivery, OrderFlowError> {
        let order = self.visible_order(actor, order_id).await?;
        if !actor.is_admin && !actor.is(order.buyer_id) {
            return Err(OrderFlowError::Forbidden);
        }
        if order.status != OrderStatus::Completed {
            return Err(OrderFlowError::DeliveryNotAvailable(order.status));
        }
        let record = self.db.fetch_delivery(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        debug!("🛒️ Delivery for order #{order_id} released to {actor}");
        Ok(Delivery::from(record))
    }

    /// Fetches the order if `actor` is the buyer, the seller or an admin. Everyone else gets `OrderNotFound`, so
    /// that order ids cannot be guessed.
    pub async fn order_for_actor(&self, actor: &Actor, order_id: i64) -> Result<Order, OrderFlowError> {
        self.visible_order(actor, order_id).await
    }

    pub async fn order_history(
        &self,
        actor: &Actor,
        order_id: i64,
    ) -> Result<Vec<OrderStatusLogEntry>, OrderFlowError> {
        let _order = self.visible_order(actor, order_id).await?;
        self.db.fetch_order_history(order_id).await
    }

    pub async fn purchases(
        &self,
        buyer_id: i64,
        statuses: Option<Vec<OrderStatus>>,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let filter = OrderQueryFilter { buyer_id: Some(buyer_id), status: statuses, ..Default::default() };
        self.db.search_orders(filter, pagination).await
    }

    pub async fn sales(
        &self,
        seller_id: i64,
        statuses: Option<Vec<OrderStatus>>,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let filter = OrderQueryFilter { seller_id: Some(seller_id), status: statuses, ..Default::default() };
        self.db.search_orders(filter, pagination).await
    }

    /// Unrestricted order search, for admins.
    pub async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderFlowError> {
        trace!("🛒️ Order search: {filter}");
        self.db.search_orders(filter, pagination).await
    }

    async fn fetch(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    async fn visible_order(&self, actor: &Actor, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.fetch(order_id).await?;
        let participant = actor.user_id.map(|id| order.is_participant(id)).unwrap_or(false);
        if participant || actor.is_admin || actor.is_system() {
            Ok(order)
        } else {
            Err(OrderFlowError::OrderNotFound(order_id))
        }
    }
}

fn normalize_payment(mut payment: PaymentReport) -> Result<PaymentReport, ValidationError> {
    payment.tx_hash = payment.tx_hash.trim().to_string();
    validate_tx_hash(&payment.tx_hash)?;
    payment.payer_address = payment.payer_address.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
    if let Some(address) = &payment.payer_address {
        check_length("payer_address", address, 1, 128)?;
    }
    payment.note = payment.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if let Some(note) = &payment.note {
        check_length("note", note, 1, 1_000)?;
    }
    Ok(payment)
}

fn is_same_report(order: &Order, payment: &PaymentReport) -> bool {
    order.status == OrderStatus::PaidReported && order.payment_tx_hash.as_deref() == Some(payment.tx_hash.as_str())
}

/// Explains a conditional update that did not apply, given the order as it is now.
///
/// An actor who loses a race almost always finds the order already moved to a status outside `from`, which is an
/// `IllegalTransition`. `Conflict` is left for the case where the status still looks right but the row was not
/// updated.
fn miss(current: &Order, from: &[OrderStatus], to: OrderStatus) -> OrderFlowError {
    if from.contains(&current.status) {
        OrderFlowError::Conflict
    } else {
        OrderFlowError::IllegalTransition { from: current.status, to }
    }
}
