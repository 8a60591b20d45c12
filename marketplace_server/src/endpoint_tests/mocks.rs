use chrono::{DateTime, Duration, Utc};
use marketplace_engine::{
    db_types::{
        AnalyticsEvent,
        DeliveryRecord,
        NewUser,
        Order,
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
        MarketplaceStats,
        OrderFlowError,
        OrderManagement,
    },
};
use mockall::mock;

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;
        async fn fetch_user_for_login(&self, login: &str) -> Result<Option<User>, AuthApiError>;
        async fn fetch_login_record(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;
        async fn record_login(&self, user_id: i64) -> Result<(), AuthApiError>;
        async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;
        async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;
        async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), AuthApiError>;
    }
}

mock! {
    pub AccountManager {}
    impl AccountManagement for AccountManager {
        async fn fetch_user(&self, user_id: i64) -> Result<Option<UserWithRoles>, AccountApiError>;
        async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<Option<UserWithRoles>, AccountApiError>;
        async fn search_users(&self, filter: UserQueryFilter, pagination: Pagination) -> Result<Vec<UserWithRoles>, AccountApiError>;
        async fn set_user_disabled(&self, user_id: i64, disabled: bool) -> Result<Option<UserWithRoles>, AccountApiError>;
    }
}

mock! {
    pub CatalogManager {}
    impl CatalogManagement for CatalogManager {
        async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;
        async fn fetch_public_product(&self, product_id: i64) -> Result<Option<PublicProduct>, CatalogError>;
        async fn search_public_products(&self, filter: ProductQueryFilter, pagination: Pagination) -> Result<Vec<PublicProduct>, CatalogError>;
        async fn fetch_products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, CatalogError>;
        async fn fetch_products_by_status(&self, statuses: &[ProductStatus], pagination: Pagination) -> Result<Vec<Product>, CatalogError>;
        async fn update_product(&self, product_id: i64, allowed: &[ProductStatus], update: ProductUpdate) -> Result<Option<Product>, CatalogError>;
        async fn transition_product(&self, product_id: i64, transition: ProductTransition) -> Result<Option<Product>, CatalogError>;
        async fn delete_product(&self, product_id: i64, allowed: &[ProductStatus]) -> Result<bool, CatalogError>;
    }
}

mock! {
    pub OrderManager {}
    impl OrderManagement for OrderManager {
        async fn insert_order_for_product(&self, buyer_id: i64, product_id: i64) -> Result<NewOrderResult, OrderFlowError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;
        async fn transition_order(&self, order_id: i64, transition: OrderTransition) -> Result<Option<Order>, OrderFlowError>;
        async fn search_orders(&self, filter: OrderQueryFilter, pagination: Pagination) -> Result<Vec<Order>, OrderFlowError>;
        async fn fetch_order_history(&self, order_id: i64) -> Result<Vec<OrderStatusLogEntry>, OrderFlowError>;
        async fn fetch_delivery(&self, order_id: i64) -> Result<Option<DeliveryRecord>, OrderFlowError>;
        async fn expire_orders(&self, unpaid_limit: Duration, reason: &str) -> Result<Vec<Order>, OrderFlowError>;
    }
}

mock! {
    pub BlogManager {}
    impl BlogManagement for BlogManager {
        async fn insert_post(&self, author_id: i64, post: NewPost) -> Result<Post, BlogApiError>;
        async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, BlogApiError>;
        async fn fetch_post_by_slug(&self, slug: &str, locale: &str) -> Result<Option<Post>, BlogApiError>;
        async fn update_post(&self, post_id: i64, update: PostUpdate) -> Result<Option<Post>, BlogApiError>;
        async fn delete_post(&self, post_id: i64) -> Result<bool, BlogApiError>;
        async fn search_posts(&self, filter: PostQueryFilter, pagination: Pagination) -> Result<Vec<Post>, BlogApiError>;
    }
}

mock! {
    pub AnalyticsManager {}
    impl AnalyticsManagement for AnalyticsManager {
        async fn insert_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AnalyticsError>;
        async fn event_counts(&self, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Result<Vec<EventCount>, AnalyticsError>;
        async fn recent_events(&self, pagination: Pagination) -> Result<Vec<AnalyticsEvent>, AnalyticsError>;
    }
}

mock! {
    pub StatsManager {}
    impl MarketplaceStats for StatsManager {
        async fn dashboard_stats(&self) -> Result<DashboardStats, AccountApiError>;
    }
}
