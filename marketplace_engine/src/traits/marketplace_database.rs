use crate::traits::{
    AccountManagement,
    AnalyticsManagement,
    AuthManagement,
    BlogManagement,
    CatalogManagement,
    MarketplaceStats,
    OrderManagement,
};

/// This trait ties together all of the behaviour a backend must provide to support the marketplace engine.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase:
    Clone
    + AuthManagement
    + AccountManagement
    + CatalogManagement
    + OrderManagement
    + BlogManagement
    + AnalyticsManagement
    + MarketplaceStats
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
