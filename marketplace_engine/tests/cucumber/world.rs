use std::collections::HashMap;

use cucumber::World;
use log::*;
use marketplace_engine::{
    db_types::{Actor, Order},
    events::EventProducers,
    test_utils::{create_database, random_db_path, run_migrations},
    AuthApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketplaceWorld {
    pub system: Option<MarketplaceSystem>,
    /// Registered users, by username
    pub actors: HashMap<String, Actor>,
    /// Approved listings, by name
    pub products: HashMap<String, i64>,
    /// The most recent order for each buyer
    pub orders: HashMap<String, i64>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub auth: AuthApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
}

impl MarketplaceWorld {
    pub fn system(&self) -> &MarketplaceSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn actor(&self, name: &str) -> Actor {
        *self.actors.get(name).unwrap_or_else(|| panic!("No user named {name}"))
    }

    pub fn user_id(&self, name: &str) -> i64 {
        self.actor(name).user_id.expect("Registered users always have an id")
    }

    pub fn order_id(&self, buyer: &str) -> i64 {
        *self.orders.get(buyer).unwrap_or_else(|| panic!("{buyer} has not placed an order"))
    }

    pub async fn order(&self, buyer: &str) -> Order {
        let actor = self.actor(buyer);
        self.system().orders.order_for_actor(&actor, self.order_id(buyer)).await.expect("Error fetching order")
    }
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        run_migrations(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 2).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {db_path}");
        let producers = EventProducers::default();
        Self {
            auth: AuthApi::new(db.clone()),
            catalog: CatalogApi::new(db.clone(), producers.clone()),
            orders: OrderFlowApi::new(db.clone(), producers),
            db,
            db_path,
        }
    }
}
