use mkt_common::MicroUnits;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CurrencyVolume {
    pub currency: String,
    pub volume: MicroUnits,
    pub orders: i64,
}

/// Headline numbers for the admin console
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub products: Vec<StatusCount>,
    pub orders: Vec<StatusCount>,
    pub completed_volume: Vec<CurrencyVolume>,
    pub orders_last_24h: i64,
}

impl DashboardStats {
    pub fn order_count(&self, status: &str) -> i64 {
        self.orders.iter().find(|c| c.status == status).map(|c| c.count).unwrap_or(0)
    }

    pub fn product_count(&self, status: &str) -> i64 {
        self.products.iter().find(|c| c.status == status).map(|c| c.count).unwrap_or(0)
    }
}
