use thiserror::Error;

use crate::{
    db_types::UserWithRoles,
    mkt_api::account_objects::{Pagination, ProfileUpdate, UserQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("{0}")]
    ValidationError(String),
    #[error("Admins cannot disable their own account")]
    CannotDisableSelf,
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// The `AccountManagement` trait defines behaviour for reading and maintaining user profiles.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the user with the given id, along with their roles. If no user exists, `None` is returned.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserWithRoles>, AccountApiError>;

    /// Applies the non-empty fields of `update` to the user's profile and returns the updated record.
    /// An empty wallet address clears the stored one.
    async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<UserWithRoles>, AccountApiError>;

    /// Admin user search, ordered by user id.
    async fn search_users(
        &self,
        filter: UserQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<UserWithRoles>, AccountApiError>;

    /// Sets or clears the `disabled` flag. Returns `None` if the user does not exist.
    async fn set_user_disabled(&self, user_id: i64, disabled: bool) -> Result<Option<UserWithRoles>, AccountApiError>;
}
