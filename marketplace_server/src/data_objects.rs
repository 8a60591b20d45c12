use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use marketplace_engine::{
    db_types::{OrderStatus, ProductCategory, ProductStatus, Role, UserWithRoles},
    mkt_api::{
        account_objects::{Pagination, UserQueryFilter},
        analytics_objects::AnalyticsQuery,
        catalog_objects::{ProductQueryFilter, ProductSort},
        order_objects::OrderQueryFilter,
    },
};
use mkt_common::{MicroUnits, Secret};
use serde::{Deserialize, Serialize};

use crate::{errors::ServerError, helpers::parse_statuses};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    #[serde(default)]
    pub apply: Vec<Role>,
    #[serde(default)]
    pub revoke: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

//--------------------------------------------   Auth   ---------------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// A username or an email address
    pub login: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserWithRoles,
}

impl LoginResponse {
    pub fn new(access_token: String, exp: i64, user: UserWithRoles) -> Self {
        let expires_at = Utc.timestamp_opt(exp, 0).single().unwrap_or_else(Utc::now);
        Self { access_token, token_type: "Bearer".into(), expires_at, user }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordChangeRequest {
    pub current_password: Secret<String>,
    pub new_password: Secret<String>,
}

//--------------------------------------------   Orders   -------------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewOrderRequest {
    pub product_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TakedownRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// `?status=created,paid_reported&offset=0&count=20`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl OrderListQuery {
    pub fn into_parts(self) -> Result<(Option<Vec<OrderStatus>>, Pagination), ServerError> {
        let statuses = parse_statuses::<OrderStatus>(self.status.as_deref())?;
        Ok((statuses, Pagination { offset: self.offset, count: self.count }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminOrderQuery {
    pub status: Option<String>,
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub product_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl AdminOrderQuery {
    pub fn into_parts(self) -> Result<(OrderQueryFilter, Pagination), ServerError> {
        let filter = OrderQueryFilter {
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            product_id: self.product_id,
            since: self.since,
            until: self.until,
            status: parse_statuses::<OrderStatus>(self.status.as_deref())?,
        };
        Ok((filter, Pagination { offset: self.offset, count: self.count }))
    }
}

//--------------------------------------------   Catalog   ------------------------------------------------------------
/// Catalog search parameters. Prices are given in micro-units.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<ProductCategory>,
    pub q: Option<String>,
    pub seller: Option<String>,
    pub currency: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort: Option<ProductSort>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl CatalogQuery {
    pub fn into_parts(self) -> (ProductQueryFilter, Pagination) {
        let filter = ProductQueryFilter {
            category: self.category,
            q: self.q.filter(|q| !q.trim().is_empty()),
            seller: self.seller,
            currency: self.currency.map(|c| c.to_uppercase()),
            min_price: self.min_price.map(MicroUnits::from),
            max_price: self.max_price.map(MicroUnits::from),
            sort: self.sort.unwrap_or_default(),
        };
        (filter, Pagination { offset: self.offset, count: self.count })
    }
}

/// `?status=pending_review,approved`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewQueueQuery {
    pub status: Option<String>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl ReviewQueueQuery {
    pub fn into_parts(self) -> Result<(Option<Vec<ProductStatus>>, Pagination), ServerError> {
        let statuses = parse_statuses::<ProductStatus>(self.status.as_deref())?;
        Ok((statuses, Pagination { offset: self.offset, count: self.count }))
    }
}

//--------------------------------------------   Users   --------------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
    pub disabled: Option<bool>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl UserListQuery {
    pub fn into_parts(self) -> (UserQueryFilter, Pagination) {
        let filter = UserQueryFilter { q: self.q.filter(|q| !q.trim().is_empty()), disabled: self.disabled };
        (filter, Pagination { offset: self.offset, count: self.count })
    }
}

//--------------------------------------------   Content   ------------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListQuery {
    pub locale: Option<String>,
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl PostListQuery {
    pub fn into_parts(self) -> (Option<String>, Pagination) {
        (self.locale, Pagination { offset: self.offset, count: self.count })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleQuery {
    pub locale: Option<String>,
}

//--------------------------------------------   Analytics   ----------------------------------------------------------
/// A tracking event as sent by a client. The user id and IP address are filled in by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventRequest {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsSummaryQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl From<AnalyticsSummaryQuery> for AnalyticsQuery {
    fn from(q: AnalyticsSummaryQuery) -> Self {
        AnalyticsQuery { since: q.since, until: q.until }
    }
}
