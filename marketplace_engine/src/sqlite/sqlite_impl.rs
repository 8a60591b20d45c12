//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{
    analytics,
    auth,
    begin_write,
    db_url,
    new_pool,
    orders,
    posts,
    products,
    stats,
    unique_violation,
    users,
};
use crate::{
    db_types::{
        AnalyticsEvent,
        DeliveryRecord,
        NewOrder,
        NewUser,
        Order,
        OrderStatus,
        OrderStatusLogEntry,
        Post,
        Product,
        ProductStatus,
        PublicProduct,
        Role,
        User,
        UserWithRoles,
    },
    mkt_api::{
        account_objects::{Pagination, ProfileUpdate, UserQueryFilter},
        analytics_objects::{EventCount, NewAnalyticsEvent},
        blog_objects::{NewPost, PostQueryFilter, PostUpdate},
        catalog_objects::{NewProduct, ProductQueryFilter, ProductTransition, ProductUpdate},
        order_objects::{NewOrderResult, OrderQueryFilter, OrderTransition},
        stats_objects::DashboardStats,
    },
    traits::{
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
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `MKT_DATABASE_URL` or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Migrations are embedded in the binary.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        auth::assign_roles(user.id, &[Role::User], &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ User #{} ({}) created", user.id, user.username);
        Ok(user)
    }

    async fn fetch_user_for_login(&self, login: &str) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_login(login, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_login_record(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn record_login(&self, user_id: i64) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::record_login(user_id, &mut conn).await?;
        Ok(())
    }

    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::roles_for_user(user_id, &mut conn).await
    }

    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::assign_roles(user_id, roles, &mut conn).await
    }

    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::remove_roles(user_id, roles, &mut conn).await
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        users::update_password_hash(user_id, password_hash, &mut conn).await
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserWithRoles>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_with_roles(user_id, &mut conn).await
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<UserWithRoles>, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        if users::update_profile(user_id, update, &mut tx).await?.is_none() {
            return Ok(None);
        }
        let user = users::fetch_user_with_roles(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn search_users(
        &self,
        filter: UserQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<UserWithRoles>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let found = users::search_users(filter, pagination, &mut conn).await?;
        let mut result = Vec::with_capacity(found.len());
        for user in found {
            let roles = auth::roles_for_user(user.id, &mut conn)
                .await
                .map_err(|e| AccountApiError::DatabaseError(e.to_string()))?;
            result.push(UserWithRoles::new(user, roles));
        }
        Ok(result)
    }

    async fn set_user_disabled(&self, user_id: i64, disabled: bool) -> Result<Option<UserWithRoles>, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        if !users::set_disabled(user_id, disabled, &mut tx).await? {
            return Ok(None);
        }
        let user = users::fetch_user_with_roles(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(seller_id, product, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_public_product(&self, product_id: i64) -> Result<Option<PublicProduct>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_public_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn search_public_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<PublicProduct>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        products::search_public_products(filter, pagination, &mut conn).await
    }

    async fn fetch_products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products_for_seller(seller_id, &mut conn).await?;
        Ok(products)
    }

    async fn fetch_products_by_status(
        &self,
        statuses: &[ProductStatus],
        pagination: Pagination,
    ) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products_by_status(statuses, pagination, &mut conn).await?;
        Ok(products)
    }

    async fn update_product(
        &self,
        product_id: i64,
        allowed: &[ProductStatus],
        update: ProductUpdate,
    ) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::update_product(product_id, allowed, update, &mut conn).await?;
        Ok(product)
    }

    async fn transition_product(
        &self,
        product_id: i64,
        transition: ProductTransition,
    ) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::transition_product(product_id, transition, &mut conn).await?;
        Ok(product)
    }

    async fn delete_product(&self, product_id: i64, allowed: &[ProductStatus]) -> Result<bool, CatalogError> {
        let mut tx = begin_write(&self.pool).await?;
        if products::count_orders_for_product(product_id, &mut tx).await? > 0 {
            return Err(CatalogError::ProductHasOrders);
        }
        let deleted = products::delete_product(product_id, allowed, &mut tx).await?;
        tx.commit().await?;
        if deleted {
            debug!("🗃️ Product #{product_id} deleted");
        }
        Ok(deleted)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order_for_product(&self, buyer_id: i64, product_id: i64) -> Result<NewOrderResult, OrderFlowError> {
        let mut tx = begin_write(&self.pool).await?;
        let product =
            products::fetch_product(product_id, &mut tx).await?.ok_or(OrderFlowError::ProductNotFound(product_id))?;
        if product.status != ProductStatus::Approved {
            return Err(OrderFlowError::ProductNotForSale);
        }
        if product.seller_id == buyer_id {
            return Err(OrderFlowError::CannotBuyOwnProduct);
        }
        let completed = orders::fetch_order_for_buyer(buyer_id, product_id, &[OrderStatus::Completed], &mut tx).await?;
        if let Some(done) = completed {
            return Err(OrderFlowError::AlreadyPurchased(done.id));
        }
        if let Some(open) = orders::fetch_order_for_buyer(buyer_id, product_id, &OrderStatus::OPEN, &mut tx).await? {
            debug!("🗃️ Buyer #{buyer_id} already has open order #{} for product #{product_id}", open.id);
            return Ok(NewOrderResult::new(open, false));
        }
        let seller = users::fetch_user_by_id(product.seller_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::ProductNotFound(product_id))?;
        let pay_to_address = seller.wallet_address.filter(|a| !a.is_empty()).ok_or(OrderFlowError::SellerHasNoWallet)?;
        let new_order = NewOrder {
            product_id,
            buyer_id,
            seller_id: product.seller_id,
            product_title: product.title,
            amount: product.price,
            currency: product.currency,
            pay_to_address,
            delivery_type: product.delivery_type,
        };
        let order = match orders::insert_order(new_order, &mut tx).await {
            Ok(order) => order,
            Err(e) if unique_violation(&e).is_some() => {
                // Another request placed the same order between our check and the insert
                drop(tx);
                let mut conn = self.pool.acquire().await?;
                let open = orders::fetch_order_for_buyer(buyer_id, product_id, &OrderStatus::OPEN, &mut conn)
                    .await?
                    .ok_or(OrderFlowError::Conflict)?;
                return Ok(NewOrderResult::new(open, false));
            },
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(NewOrderResult::new(order, true))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn transition_order(
        &self,
        order_id: i64,
        transition: OrderTransition,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        orders::transition_order(order_id, transition, &mut conn).await
    }

    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(filter, pagination, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<OrderStatusLogEntry>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let history = orders::fetch_order_history(order_id, &mut conn).await?;
        Ok(history)
    }

    async fn fetch_delivery(&self, order_id: i64) -> Result<Option<DeliveryRecord>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let delivery = orders::fetch_delivery(order_id, &mut conn).await?;
        Ok(delivery)
    }

    async fn expire_orders(&self, unpaid_limit: Duration, reason: &str) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let expired = orders::expire_orders(unpaid_limit, reason, &mut conn).await?;
        Ok(expired)
    }
}

impl BlogManagement for SqliteDatabase {
    async fn insert_post(&self, author_id: i64, post: NewPost) -> Result<Post, BlogApiError> {
        let mut conn = self.pool.acquire().await?;
        posts::insert_post(author_id, post, &mut conn).await
    }

    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, BlogApiError> {
        let mut conn = self.pool.acquire().await?;
        let post = posts::fetch_post(post_id, &mut conn).await?;
        Ok(post)
    }

    async fn fetch_post_by_slug(&self, slug: &str, locale: &str) -> Result<Option<Post>, BlogApiError> {
        let mut conn = self.pool.acquire().await?;
        let post = posts::fetch_post_by_slug(slug, locale, &mut conn).await?;
        Ok(post)
    }

    async fn update_post(&self, post_id: i64, update: PostUpdate) -> Result<Option<Post>, BlogApiError> {
        let mut conn = self.pool.acquire().await?;
        posts::update_post(post_id, update, &mut conn).await
    }

    async fn delete_post(&self, post_id: i64) -> Result<bool, BlogApiError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = posts::delete_post(post_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn search_posts(&self, filter: PostQueryFilter, pagination: Pagination) -> Result<Vec<Post>, BlogApiError> {
        let mut conn = self.pool.acquire().await?;
        let posts = posts::search_posts(filter, pagination, &mut conn).await?;
        Ok(posts)
    }
}

impl AnalyticsManagement for SqliteDatabase {
    async fn insert_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        let event = analytics::insert_event(event, &mut conn).await?;
        Ok(event)
    }

    async fn event_counts(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventCount>, AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        let counts = analytics::event_counts(since, until, &mut conn).await?;
        Ok(counts)
    }

    async fn recent_events(&self, pagination: Pagination) -> Result<Vec<AnalyticsEvent>, AnalyticsError> {
        let mut conn = self.pool.acquire().await?;
        let events = analytics::recent_events(pagination, &mut conn).await?;
        Ok(events)
    }
}

impl MarketplaceStats for SqliteDatabase {
    async fn dashboard_stats(&self) -> Result<DashboardStats, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let total_users = users::count_users(&mut conn).await?;
        let products = stats::product_counts(&mut conn).await?;
        let orders = stats::order_counts(&mut conn).await?;
        let completed_volume = stats::completed_volume(&mut conn).await?;
        let orders_last_24h = stats::orders_since(Duration::hours(24), &mut conn).await?;
        Ok(DashboardStats { total_users, products, orders, completed_volume, orders_last_24h })
    }
}
