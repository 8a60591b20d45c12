use std::fmt::Debug;

use crate::{
    mkt_api::stats_objects::DashboardStats,
    traits::{AccountApiError, MarketplaceStats},
};

/// Read-only figures for the admin dashboard. Moderation actions live on the API that owns the data.
pub struct AdminApi<B> {
    db: B,
}

impl<B: Debug> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi ({:?})", self.db)
    }
}

impl<B> AdminApi<B>
where B: MarketplaceStats
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AccountApiError> {
        self.db.dashboard_stats().await
    }
}
