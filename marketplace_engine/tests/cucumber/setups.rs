use cucumber::given;
use marketplace_engine::{
    db_types::{Actor, DeliveryType, ProductCategory, Role},
    mkt_api::{
        account_objects::Registration,
        catalog_objects::{NewProduct, ReviewDecision},
    },
};
use mkt_common::MicroUnits;

use crate::cucumber::{world::MarketplaceSystem, MarketplaceWorld};

const PASSWORD: &str = "cucumber password";

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketplaceWorld) {
    let system = MarketplaceSystem::new().await;
    world.system = Some(system);
}

async fn register(world: &mut MarketplaceWorld, name: &str, wallet: bool) {
    let email = format!("{name}@example.com");
    let mut registration = Registration::new(name, email.as_str(), PASSWORD);
    if wallet {
        registration = registration.with_wallet_address(format!("0x{name}_wallet_000000000000000000"));
    }
    let user = world.system().auth.register(registration).await.expect("Error registering user");
    world.actors.insert(name.to_string(), Actor::new(user.user.id, &user.roles));
}

#[given(expr = "an admin named '{word}'")]
async fn admin(world: &mut MarketplaceWorld, name: String) {
    let email = format!("{name}@example.com");
    let registration = Registration::new(name.as_str(), email.as_str(), PASSWORD);
    let user = world.system().auth.ensure_admin(registration).await.expect("Error creating admin");
    world.actors.insert(name, Actor::new(user.id, &[Role::User, Role::Admin]));
}

#[given(expr = "a seller named '{word}' with a wallet")]
async fn seller(world: &mut MarketplaceWorld, name: String) {
    register(world, &name, true).await;
}

#[given(expr = "a buyer named '{word}'")]
async fn buyer(world: &mut MarketplaceWorld, name: String) {
    register(world, &name, false).await;
}

#[given(expr = "an approved listing '{word}' by '{word}' priced at {int} USDT")]
async fn approved_listing(world: &mut MarketplaceWorld, listing: String, seller: String, price: i64) {
    let seller_id = world.user_id(&seller);
    let admin_id = world
        .actors
        .values()
        .find(|a| a.is_admin)
        .and_then(|a| a.user_id)
        .expect("An admin must be set up before listings can be approved");
    let catalog = &world.system().catalog;
    let new_product = NewProduct::new(
        listing.as_str(),
        ProductCategory::Prompt,
        MicroUnits::from_units(price),
        DeliveryType::AutoHosted,
        "https://cdn.example.com/cucumber.zip",
    );
    let product = catalog.create_product(seller_id, new_product).await.expect("Error creating listing");
    catalog.submit_for_review(seller_id, product.id).await.expect("Error submitting listing");
    catalog.review_product(admin_id, product.id, ReviewDecision::approve()).await.expect("Error approving listing");
    world.products.insert(listing, product.id);
}
