//! User profiles and admin user management.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::UserWithRoles,
    mkt_api::account_objects::{Pagination, ProfileUpdate, UserQueryFilter},
    traits::{AccountApiError, AccountManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the user with the given id. If no user exists, `None` is returned.
    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<UserWithRoles>, AccountApiError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<UserWithRoles, AccountApiError> {
        update.validate()?;
        let user = self.db.update_profile(user_id, update).await?.ok_or(AccountApiError::UserNotFound(user_id))?;
        debug!("🔑️ Profile for user #{user_id} updated");
        Ok(user)
    }

    pub async fn search_users(
        &self,
        filter: UserQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<UserWithRoles>, AccountApiError> {
        trace!("🔑️ User search: {filter:?} {pagination:?}");
        self.db.search_users(filter, pagination).await
    }

    /// Disables or re-enables an account. Disabled users cannot log in and their tokens are refused.
    /// Admins cannot disable themselves.
    pub async fn set_user_disabled(
        &self,
        admin_id: i64,
        user_id: i64,
        disabled: bool,
    ) -> Result<UserWithRoles, AccountApiError> {
        if disabled && admin_id == user_id {
            return Err(AccountApiError::CannotDisableSelf);
        }
        let user =
            self.db.set_user_disabled(user_id, disabled).await?.ok_or(AccountApiError::UserNotFound(user_id))?;
        info!("🔑️ Admin #{admin_id} {} user #{user_id}", if disabled { "disabled" } else { "enabled" });
        Ok(user)
    }
}
