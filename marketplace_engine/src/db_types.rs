use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use mkt_common::MicroUnits;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

/// Implements `Display` and `FromStr` for the plain enums that are stored as TEXT columns.
/// The strings must match the `snake_case` names that sqlx and serde use.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($text),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{s} is not a valid {}", stringify!($name)))),
                }
            }
        }
    };
}

//--------------------------------------        Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Every registered account. Can buy, sell, and manage its own listings and orders.
    User,
    /// Moderators. Can review listings, manage users and intervene in any order.
    Admin,
}

text_enum!(Role { User => "user", Admin => "admin" });

pub type Roles = Vec<Role>;

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub display_name: String,
    pub wallet_address: Option<String>,
    pub bio: Option<String>,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Roles,
}

impl UserWithRoles {
    pub fn new(user: User, roles: Roles) -> Self {
        Self { user, roles }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// A user record ready for insertion. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub wallet_address: Option<String>,
}

//--------------------------------------        Actor        ---------------------------------------------------------
/// Whoever is performing an operation. The system (expiry worker, automatic completion) has no user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub is_admin: bool,
}

impl Actor {
    pub fn user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), is_admin: false }
    }

    pub fn admin(user_id: i64) -> Self {
        Self { user_id: Some(user_id), is_admin: true }
    }

    pub fn system() -> Self {
        Self { user_id: None, is_admin: false }
    }

    pub fn new(user_id: i64, roles: &[Role]) -> Self {
        Self { user_id: Some(user_id), is_admin: roles.contains(&Role::Admin) }
    }

    pub fn is_system(&self) -> bool {
        self.user_id.is_none()
    }

    /// True if this actor is the given user.
    pub fn is(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.user_id, self.is_admin) {
            (None, _) => write!(f, "system"),
            (Some(id), true) => write!(f, "admin #{id}"),
            (Some(id), false) => write!(f, "user #{id}"),
        }
    }
}

//--------------------------------------   ProductCategory   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Prompt,
    Code,
    Dataset,
    Other,
}

text_enum!(ProductCategory { Prompt => "prompt", Code => "code", Dataset => "dataset", Other => "other" });

//--------------------------------------    DeliveryType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    /// The delivery content (a URL or a blob of text) is released to the buyer as soon as the order completes.
    AutoHosted,
    /// The delivery content holds seller instructions. The goods themselves are handed over out of band.
    Manual,
}

text_enum!(DeliveryType { AutoHosted => "auto_hosted", Manual => "manual" });

//--------------------------------------    ProductStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Newly created. Only the seller can see it.
    Draft,
    /// Submitted and waiting for an admin.
    PendingReview,
    /// Visible in the public catalog and available for purchase.
    Approved,
    /// Rejected by an admin. The review note says why.
    Rejected,
    /// Withdrawn from sale, either by the seller or by an admin.
    OffShelf,
}

text_enum!(ProductStatus {
    Draft => "draft",
    PendingReview => "pending_review",
    Approved => "approved",
    Rejected => "rejected",
    OffShelf => "off_shelf",
});

impl ProductStatus {
    /// Statuses in which the seller may still edit the listing
    pub const EDITABLE: [ProductStatus; 3] = [ProductStatus::Draft, ProductStatus::Rejected, ProductStatus::OffShelf];
    /// Statuses from which a listing may be submitted for review
    pub const SUBMITTABLE: [ProductStatus; 3] =
        [ProductStatus::Draft, ProductStatus::Rejected, ProductStatus::OffShelf];
    /// Statuses in which the seller may delete the listing outright
    pub const DELETABLE: [ProductStatus; 2] = [ProductStatus::Draft, ProductStatus::Rejected];

    pub fn all() -> [ProductStatus; 5] {
        [Self::Draft, Self::PendingReview, Self::Approved, Self::Rejected, Self::OffShelf]
    }
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub category: ProductCategory,
    pub tags: Json<Vec<String>>,
    pub price: MicroUnits,
    pub currency: String,
    pub delivery_type: DeliveryType,
    pub delivery_content: String,
    pub preview: Option<String>,
    pub status: ProductStatus,
    pub review_note: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The catalog view of a product. It never carries the delivery content or moderation details.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PublicProduct {
    pub id: i64,
    pub seller_id: i64,
    pub seller_username: String,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub category: ProductCategory,
    pub tags: Json<Vec<String>>,
    pub price: MicroUnits,
    pub currency: String,
    pub delivery_type: DeliveryType,
    pub preview: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// The buyer has committed to the purchase. No payment has been reported.
    Created,
    /// The buyer says the payment was sent and supplied a transaction hash.
    PaidReported,
    /// The seller (or an admin) confirmed that the funds arrived.
    Confirmed,
    /// Delivery is unlocked. Terminal.
    Completed,
    /// Cancelled by a participant, an admin, or by expiry. Terminal.
    Cancelled,
}

text_enum!(OrderStatus {
    Created => "created",
    PaidReported => "paid_reported",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Orders in these states block a second purchase of the same product by the same buyer.
    pub const OPEN: [OrderStatus; 3] = [OrderStatus::Created, OrderStatus::PaidReported, OrderStatus::Confirmed];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn all() -> [OrderStatus; 5] {
        [Self::Created, Self::PaidReported, Self::Confirmed, Self::Completed, Self::Cancelled]
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    /// Snapshot of the listing title when the order was placed
    pub product_title: String,
    /// Snapshot of the listing price when the order was placed
    pub amount: MicroUnits,
    pub currency: String,
    /// Snapshot of the seller's payout wallet when the order was placed. This is where the buyer sends funds.
    pub pay_to_address: String,
    pub delivery_type: DeliveryType,
    pub status: OrderStatus,
    pub payment_tx_hash: Option<String>,
    pub payer_address: Option<String>,
    pub payment_note: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_reported_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// True if the user is the buyer or the seller on this order
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

/// The values copied from a listing (and its seller) into a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub product_title: String,
    pub amount: MicroUnits,
    pub currency: String,
    pub pay_to_address: String,
    pub delivery_type: DeliveryType,
}

//--------------------------------------  OrderStatusLogEntry -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusLogEntry {
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub actor_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Delivery      ---------------------------------------------------------
/// Raw delivery data for an order, as read from the listing and the seller profile.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRecord {
    pub order_id: i64,
    pub delivery_type: DeliveryType,
    pub delivery_content: String,
    pub seller_email: String,
}

/// What a buyer receives once an order is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub order_id: i64,
    pub delivery_type: DeliveryType,
    /// For `auto_hosted` goods, the URL or content itself. For `manual` goods, the seller's handoff instructions.
    pub content: String,
    /// How to reach the seller for a manual handoff
    pub seller_contact: Option<String>,
}

impl From<DeliveryRecord> for Delivery {
    fn from(record: DeliveryRecord) -> Self {
        let seller_contact = match record.delivery_type {
            DeliveryType::AutoHosted => None,
            DeliveryType::Manual => Some(record.seller_email),
        };
        Self {
            order_id: record.order_id,
            delivery_type: record.delivery_type,
            content: record.delivery_content,
            seller_contact,
        }
    }
}

//--------------------------------------         Post        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub locale: String,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub published: bool,
    pub author_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------    AnalyticsEvent   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub name: String,
    pub path: Option<String>,
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub properties: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
