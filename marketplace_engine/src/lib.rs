//! Marketplace Engine
//!
//! The marketplace engine holds the domain logic for a consumer-to-consumer marketplace for digital goods (prompts,
//! code, datasets). Sellers list goods, admins review them, buyers pay sellers directly off-platform and sellers
//! confirm receipt, which unlocks delivery.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`] and the SQLite backend). The traits define what a storage
//!    backend must guarantee. You should never need to access the database directly; use the public API instead.
//!    The data types stored in the database are defined in [`mod@db_types`] and are public.
//! 2. The public API ([`mod@mkt_api`]). This decides who may do what: authentication, listings and their review,
//!    the order lifecycle, blog posts, analytics and admin statistics.
//!
//! The engine also emits events when orders are created or change status and when listings are reviewed. See
//! [`mod@events`] for how to hook into them.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod mkt_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;
#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use mkt_api::{
    accounts_api::AccountApi,
    admin_api::AdminApi,
    analytics_api::AnalyticsApi,
    auth_api::AuthApi,
    blog_api::BlogApi,
    catalog_api::CatalogApi,
    order_flow_api::OrderFlowApi,
};
pub use traits::{
    AccountApiError,
    AccountManagement,
    AnalyticsError,
    AnalyticsManagement,
    AuthApiError,
    AuthManagement,
    BlogApiError,
    BlogManagement,
    CatalogError,
    CatalogManagement,
    MarketplaceDatabase,
    MarketplaceStats,
    OrderFlowError,
    OrderManagement,
};
