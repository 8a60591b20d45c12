//! Shared setup for the engine integration tests.
#![allow(dead_code)]

use log::*;
use marketplace_engine::{
    db_types::{DeliveryType, Product, ProductCategory, User},
    events::EventProducers,
    mkt_api::{
        account_objects::Registration,
        catalog_objects::{NewProduct, ReviewDecision},
    },
    test_utils::{prepare_test_env, random_db_path},
    AccountApi,
    AdminApi,
    AnalyticsApi,
    AuthApi,
    BlogApi,
    CatalogApi,
    MarketplaceDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use mkt_common::MicroUnits;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const PASSWORD: &str = "correct horse battery";

pub struct Marketplace {
    pub db: SqliteDatabase,
    pub auth: AuthApi<SqliteDatabase>,
    pub accounts: AccountApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub blog: BlogApi<SqliteDatabase>,
    pub analytics: AnalyticsApi<SqliteDatabase>,
    pub admin: AdminApi<SqliteDatabase>,
}

impl Marketplace {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        Self {
            auth: AuthApi::new(db.clone()),
            accounts: AccountApi::new(db.clone()),
            catalog: CatalogApi::new(db.clone(), producers.clone()),
            orders: OrderFlowApi::new(db.clone(), producers),
            blog: BlogApi::new(db.clone()),
            analytics: AnalyticsApi::new(db.clone()),
            admin: AdminApi::new(db.clone()),
            db,
        }
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Could not remove test database {url}: {e}");
        }
    }

    pub async fn user(&self, username: &str) -> User {
        let email = format!("{username}@example.com");
        let reg = Registration::new(username, email.as_str(), PASSWORD);
        self.auth.register(reg).await.expect("Error registering user").user
    }

    /// A user with a payout wallet, so that their listings can be bought.
    pub async fn seller(&self, username: &str) -> User {
        let email = format!("{username}@example.com");
        let reg = Registration::new(username, email.as_str(), PASSWORD)
            .with_wallet_address(format!("0xwallet_{username}_0000000000000000"));
        self.auth.register(reg).await.expect("Error registering seller").user
    }

    pub async fn admin(&self, username: &str) -> User {
        let email = format!("{username}@example.com");
        let reg = Registration::new(username, email.as_str(), PASSWORD);
        self.auth.ensure_admin(reg).await.expect("Error creating admin")
    }

    pub async fn draft(&self, seller_id: i64, title: &str, price: i64) -> Product {
        let listing = NewProduct::new(
            title,
            ProductCategory::Prompt,
            MicroUnits::from_units(price),
            DeliveryType::AutoHosted,
            "https://cdn.example.com/goods.zip",
        );
        self.catalog.create_product(seller_id, listing).await.expect("Error creating listing")
    }

    /// Creates, submits and approves a listing.
    pub async fn listing(&self, seller_id: i64, admin_id: i64, title: &str, price: i64) -> Product {
        let product = self.draft(seller_id, title, price).await;
        self.catalog.submit_for_review(seller_id, product.id).await.expect("Error submitting listing");
        self.catalog.review_product(admin_id, product.id, ReviewDecision::approve()).await.expect("Error approving")
    }

    /// Moves an order's last update back in time, as if it had been sitting untouched.
    pub async fn backdate_order(&self, order_id: i64, hours: i64) {
        sqlx::query("UPDATE orders SET updated_at = datetime('now', $1) WHERE id = $2")
            .bind(format!("-{hours} hours"))
            .bind(order_id)
            .execute(self.db.pool())
            .await
            .expect("Error backdating order");
    }
}
