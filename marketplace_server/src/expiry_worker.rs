use chrono::Duration;
use log::*;
use marketplace_engine::{db_types::Order, events::EventProducers, OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, orders that are still `created` and have not been touched for `unpaid_timeout` are cancelled by
/// the system. Orders with a reported payment are left for the seller or an admin to resolve.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    unpaid_timeout: Duration,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = OrderFlowApi::new(db, producers);
        info!(
            "🕰️ Unpaid order expiry worker started. Checking every {}s for orders older than {} hrs",
            interval.as_secs(),
            unpaid_timeout.num_hours()
        );
        loop {
            timer.tick().await;
            trace!("🕰️ Running unpaid order expiry job");
            match api.expire_stale_orders(unpaid_timeout).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No orders expired"),
                Ok(expired) => {
                    info!("🕰️ {} orders expired", expired.len());
                    debug!("🕰️ Expired unpaid orders: {}", order_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] product: {} buyer: {}", o.id, o.product_id, o.buyer_id))
        .collect::<Vec<String>>()
        .join(", ")
}
