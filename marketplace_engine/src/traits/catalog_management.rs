use thiserror::Error;

use crate::{
    db_types::{Product, ProductStatus, PublicProduct},
    mkt_api::{
        account_objects::Pagination,
        catalog_objects::{NewProduct, ProductQueryFilter, ProductTransition, ProductUpdate},
    },
};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Only the seller may manage this listing")]
    NotOwner,
    #[error("A listing in {from} status cannot be {action}")]
    IllegalTransition { from: ProductStatus, action: String },
    #[error("{0}")]
    ValidationError(String),
    #[error("This listing has orders and cannot be deleted")]
    ProductHasOrders,
    #[error("The listing was modified by someone else. Please try again.")]
    Conflict,
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// The `CatalogManagement` trait defines behaviour for storing listings and moving them through moderation.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Stores a new listing in `draft` status. The listing must already be validated.
    async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError>;

    /// Fetches the full listing, including the delivery content. Only the seller and admins should ever see this.
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    /// Fetches the catalog view of an `approved` listing. Listings in any other status yield `None`.
    async fn fetch_public_product(&self, product_id: i64) -> Result<Option<PublicProduct>, CatalogError>;

    /// Searches the public catalog. Only `approved` listings are returned.
    async fn search_public_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<PublicProduct>, CatalogError>;

    /// All listings for a seller, newest first.
    async fn fetch_products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, CatalogError>;

    /// Listings in the given statuses, oldest first. This is the moderation queue.
    async fn fetch_products_by_status(
        &self,
        statuses: &[ProductStatus],
        pagination: Pagination,
    ) -> Result<Vec<Product>, CatalogError>;

    /// Applies `update` to the listing, but only if its status is one of `allowed`.
    /// Returns `None` if the listing was not in an allowed status when the update ran.
    async fn update_product(
        &self,
        product_id: i64,
        allowed: &[ProductStatus],
        update: ProductUpdate,
    ) -> Result<Option<Product>, CatalogError>;

    /// Moves the listing to `transition.to` if it is currently in one of `transition.from`.
    /// Returns `None` if the listing was not in one of the expected statuses.
    async fn transition_product(
        &self,
        product_id: i64,
        transition: ProductTransition,
    ) -> Result<Option<Product>, CatalogError>;

    /// Deletes the listing if it is in one of the `allowed` statuses and no order has ever referenced it.
    /// Returns false if the listing was not in an allowed status.
    async fn delete_product(&self, product_id: i64, allowed: &[ProductStatus]) -> Result<bool, CatalogError>;
}
