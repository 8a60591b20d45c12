//! # Marketplace engine public API
//!
//! The `mkt_api` module exposes the programmatic API for the marketplace engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`auth_api`] registers users, checks passwords and manages [`Role`](crate::db_types::Role)s.
//! * [`accounts_api`] reads and updates user profiles.
//! * [`catalog_api`] manages listings and their moderation.
//! * [`order_flow_api`] is the order lifecycle: purchase, payment report, confirmation, cancellation, expiry and
//!   delivery.
//! * [`blog_api`] manages localized posts.
//! * [`analytics_api`] records and summarises tracking events.
//! * [`admin_api`] produces the dashboard figures.
//!
//! The `*_objects` submodules hold the request and query types used by the APIs.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use marketplace_engine::{CatalogApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CatalogManagement
//! let api = CatalogApi::new(db, producers);
//! let listing = api.public_product(42).await?;
//! ```
pub mod account_objects;
pub mod accounts_api;
pub mod admin_api;
pub mod analytics_api;
pub mod analytics_objects;
pub mod auth_api;
pub mod blog_api;
pub mod blog_objects;
pub mod catalog_api;
pub mod catalog_objects;
pub mod order_flow_api;
pub mod order_objects;
pub mod stats_objects;
