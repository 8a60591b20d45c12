use crate::{mkt_api::stats_objects::DashboardStats, traits::AccountApiError};

#[allow(async_fn_in_trait)]
pub trait MarketplaceStats {
    /// Headline numbers for the admin dashboard. Orders "in the last 24 hours" are counted relative to the time of
    /// the call.
    async fn dashboard_stats(&self) -> Result<DashboardStats, AccountApiError>;
}
