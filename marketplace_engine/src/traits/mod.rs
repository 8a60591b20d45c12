//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the marketplace engine database *backends*.
//!
//! The API layer in [`crate::mkt_api`] decides *who* may do *what*. The backends only guarantee that every change is
//! applied atomically, and that status changes only happen from the expected state. A backend that loses a race
//! reports it by returning `None` (or a conflict error) rather than silently overwriting someone else's change.
//!
//! ## Traits
//! * [`MarketplaceDatabase`] ties all of the backend behaviour together.
//! * [`AuthManagement`] creates users, stores password hashes and manages roles.
//! * [`AccountManagement`] queries and updates user profiles.
//! * [`CatalogManagement`] stores listings and applies listing status changes.
//! * [`OrderManagement`] stores orders, applies order status changes and exposes the audit trail.
//! * [`BlogManagement`] stores localized blog posts.
//! * [`AnalyticsManagement`] stores and aggregates tracking events.
//! * [`MarketplaceStats`] produces the admin dashboard figures.
mod account_management;
mod analytics_management;
mod auth_management;
mod blog_management;
mod catalog_management;
mod marketplace_database;
mod marketplace_stats;
mod order_management;

pub use account_management::{AccountApiError, AccountManagement};
pub use analytics_management::{AnalyticsError, AnalyticsManagement};
pub use auth_management::{AuthApiError, AuthManagement};
pub use blog_management::{BlogApiError, BlogManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use marketplace_database::MarketplaceDatabase;
pub use marketplace_stats::MarketplaceStats;
pub use order_management::{OrderFlowError, OrderManagement};
