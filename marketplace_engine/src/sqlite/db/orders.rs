//! Orders and their audit trail.
//!
//! The `orders_insert_log` and `orders_status_log` triggers write the status log from the `last_actor_id` and
//! `last_note` columns, so every function that changes an order's status must set both of those in the same statement.
use chrono::{Duration, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{in_list, is_trigger_violation, unique_violation};
use crate::{
    db_types::{DeliveryRecord, NewOrder, Order, OrderStatus, OrderStatusLogEntry},
    mkt_api::{
        account_objects::Pagination,
        order_objects::{OrderQueryFilter, OrderTransition},
    },
    traits::OrderFlowError,
};

/// Inserts a new order in `created` status using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                product_id,
                buyer_id,
                seller_id,
                product_title,
                amount,
                currency,
                pay_to_address,
                delivery_type,
                last_actor_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $2)
            RETURNING *;
        "#,
    )
    .bind(order.product_id)
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.product_title)
    .bind(order.amount)
    .bind(order.currency)
    .bind(order.pay_to_address)
    .bind(order.delivery_type)
    .fetch_one(conn)
    .await?;
    // The DB triggers the initial status log entry for the order
    debug!("🛒️ Order #{} inserted for product #{}", order.id, order.product_id);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

/// The buyer's most recent order for the product that is in one of the given statuses.
pub async fn fetch_order_for_buyer(
    buyer_id: i64,
    product_id: i64,
    statuses: &[OrderStatus],
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let q = format!(
        "SELECT * FROM orders WHERE buyer_id = $1 AND product_id = $2 AND status IN ({}) ORDER BY id DESC LIMIT 1",
        in_list(statuses)
    );
    sqlx::query_as(&q).bind(buyer_id).bind(product_id).fetch_optional(conn).await
}

/// Applies the status change only if the order is currently in one of `transition.from`.
pub async fn transition_order(
    order_id: i64,
    transition: OrderTransition,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderFlowError> {
    let to = transition.to;
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, status = ");
    builder.push_bind(to);
    builder.push(", last_actor_id = ");
    builder.push_bind(transition.actor_id);
    builder.push(", last_note = ");
    builder.push_bind(transition.note);
    match to {
        OrderStatus::Created => {},
        OrderStatus::PaidReported => {
            builder.push(", paid_reported_at = CURRENT_TIMESTAMP");
            if let Some(payment) = transition.payment {
                builder.push(", payment_tx_hash = ");
                builder.push_bind(payment.tx_hash);
                builder.push(", payer_address = ");
                builder.push_bind(payment.payer_address);
                builder.push(", payment_note = ");
                builder.push_bind(payment.note);
            }
        },
        OrderStatus::Confirmed => {
            builder.push(", confirmed_at = CURRENT_TIMESTAMP");
        },
        OrderStatus::Completed => {
            builder.push(", completed_at = CURRENT_TIMESTAMP");
        },
        OrderStatus::Cancelled => {
            builder.push(", cancelled_at = CURRENT_TIMESTAMP, cancelled_by = ");
            builder.push_bind(transition.actor_id);
            builder.push(", cancel_reason = ");
            builder.push_bind(transition.cancel_reason);
        },
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order_id);
    builder.push(format!(" AND status IN ({}) RETURNING *", in_list(&transition.from)));
    trace!("🛒️ Executing query: {}", builder.sql());
    let result = builder.build_query_as::<Order>().fetch_optional(&mut *conn).await;
    match result {
        Ok(order) => Ok(order),
        Err(e) if unique_violation(&e).is_some() => Err(OrderFlowError::DuplicateTxHash),
        Err(e) if is_trigger_violation(&e) => {
            let current = fetch_order(order_id, conn).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
            Err(OrderFlowError::IllegalTransition { from: current.status, to })
        },
        Err(e) => Err(e.into()),
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in descending order
pub async fn search_orders(
    query: OrderQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id);
    }
    match query.status.as_deref() {
        Some([]) => {
            where_clause.push("1 = 0");
        },
        Some(statuses) => {
            where_clause.push(format!("status IN ({})", in_list(statuses)));
        },
        None => {},
    }
    if let Some(since) = query.since {
        where_clause.push("unixepoch(created_at) >= ");
        where_clause.push_bind_unseparated(since.timestamp());
    }
    if let Some(until) = query.until {
        where_clause.push("unixepoch(created_at) <= ");
        where_clause.push_bind_unseparated(until.timestamp());
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());

    trace!("🛒️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🛒️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

pub async fn fetch_order_history(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusLogEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_log WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_delivery(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<DeliveryRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT o.id AS order_id, o.delivery_type, p.delivery_content, u.email AS seller_email
        FROM orders o
            JOIN products p ON p.id = o.product_id
            JOIN users u ON u.id = o.seller_id
        WHERE o.id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await
}

/// Cancels `created` orders that have not been updated within `unpaid_limit`. The system is recorded as the actor.
pub async fn expire_orders(
    unpaid_limit: Duration,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let cutoff = (Utc::now() - unpaid_limit).timestamp();
    let orders: Vec<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET
            status = 'cancelled',
            updated_at = CURRENT_TIMESTAMP,
            cancelled_at = CURRENT_TIMESTAMP,
            cancelled_by = NULL,
            cancel_reason = $1,
            last_actor_id = NULL,
            last_note = $1
        WHERE status = 'created' AND unixepoch(updated_at) < $2
        RETURNING *
        "#,
    )
    .bind(reason)
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
