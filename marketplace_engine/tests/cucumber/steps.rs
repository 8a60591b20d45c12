use chrono::Duration;
use cucumber::{then, when};
use marketplace_engine::{
    db_types::OrderStatus,
    mkt_api::{account_objects::Pagination, order_objects::PaymentReport},
};

use crate::cucumber::MarketplaceWorld;

#[when(expr = "'{word}' orders '{word}'")]
async fn place_order(world: &mut MarketplaceWorld, buyer: String, listing: String) {
    let product_id = *world.products.get(&listing).expect("Unknown listing");
    let result = world.system().orders.create_order(world.user_id(&buyer), product_id).await;
    let result = result.expect("Error placing order");
    world.orders.insert(buyer, result.order.id);
}

#[when(expr = "'{word}' orders '{word}' again")]
async fn place_order_again(world: &mut MarketplaceWorld, buyer: String, listing: String) {
    place_order(world, buyer, listing).await;
}

#[when(expr = "'{word}' reports payment with tx hash '{word}'")]
async fn report_payment(world: &mut MarketplaceWorld, buyer: String, tx_hash: String) {
    let order_id = world.order_id(&buyer);
    let buyer_id = world.user_id(&buyer);
    let payment = PaymentReport::new(tx_hash);
    world.system().orders.report_payment(buyer_id, order_id, payment).await.expect("Error reporting payment");
}

#[when(expr = "'{word}' confirms the payment for '{word}'")]
async fn confirm_payment(world: &mut MarketplaceWorld, seller: String, buyer: String) {
    let actor = world.actor(&seller);
    let order_id = world.order_id(&buyer);
    world.system().orders.confirm_payment(actor, order_id).await.expect("Error confirming payment");
}

#[when(expr = "'{word}' tries to cancel the order")]
async fn try_cancel(world: &mut MarketplaceWorld, buyer: String) {
    let actor = world.actor(&buyer);
    let order_id = world.order_id(&buyer);
    let result = world.system().orders.cancel_order(actor, order_id, None).await;
    world.last_error = result.err().map(|e| format!("{e:?}"));
}

#[when(expr = "'{word}' cancels the order for '{word}'")]
async fn cancel_for(world: &mut MarketplaceWorld, canceller: String, buyer: String) {
    let actor = world.actor(&canceller);
    let order_id = world.order_id(&buyer);
    world.system().orders.cancel_order(actor, order_id, None).await.expect("Error cancelling order");
}

#[when(expr = "the order for '{word}' is left untouched for {int} hours")]
async fn backdate(world: &mut MarketplaceWorld, buyer: String, hours: i64) {
    let order_id = world.order_id(&buyer);
    sqlx::query("UPDATE orders SET updated_at = datetime('now', $1) WHERE id = $2")
        .bind(format!("-{hours} hours"))
        .bind(order_id)
        .execute(world.system().db.pool())
        .await
        .expect("Error backdating order");
}

#[when(expr = "the expiry worker runs with a {int} hour limit")]
async fn run_expiry(world: &mut MarketplaceWorld, hours: i64) {
    world.system().orders.expire_stale_orders(Duration::hours(hours)).await.expect("Error expiring orders");
}

#[then(expr = "the order for '{word}' is {word}")]
async fn order_status(world: &mut MarketplaceWorld, buyer: String, status: String) {
    let expected = status.parse::<OrderStatus>().expect("Not a valid order status");
    let order = world.order(&buyer).await;
    assert_eq!(order.status, expected);
}

#[then(expr = "the delivery for '{word}' is not available")]
async fn delivery_unavailable(world: &mut MarketplaceWorld, buyer: String) {
    let actor = world.actor(&buyer);
    let result = world.system().orders.delivery(&actor, world.order_id(&buyer)).await;
    assert!(result.is_err(), "Delivery was released early");
}

#[then(expr = "'{word}' can download the delivery")]
async fn delivery_available(world: &mut MarketplaceWorld, buyer: String) {
    let actor = world.actor(&buyer);
    let delivery = world.system().orders.delivery(&actor, world.order_id(&buyer)).await.expect("No delivery");
    assert_eq!(delivery.content, "https://cdn.example.com/cucumber.zip");
}

#[then(expr = "the order history for '{word}' reads '{word}'")]
async fn order_history(world: &mut MarketplaceWorld, buyer: String, expected: String) {
    let actor = world.actor(&buyer);
    let history = world.system().orders.order_history(&actor, world.order_id(&buyer)).await.expect("No history");
    let steps = history.iter().map(|e| e.to_status.to_string()).collect::<Vec<_>>().join(",");
    assert_eq!(steps, expected);
}

#[then(expr = "the request fails with '{word}'")]
async fn request_fails(world: &mut MarketplaceWorld, error: String) {
    let last_error = world.last_error.take().expect("The request did not fail");
    assert!(last_error.starts_with(&error), "Expected {error}, got {last_error}");
}

#[then(expr = "'{word}' has {int} purchase(s)")]
async fn purchase_count(world: &mut MarketplaceWorld, buyer: String, count: usize) {
    let purchases = world.system().orders.purchases(world.user_id(&buyer), None, Pagination::default()).await;
    assert_eq!(purchases.expect("Error fetching purchases").len(), count);
}
