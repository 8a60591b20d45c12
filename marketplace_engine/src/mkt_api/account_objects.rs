use mkt_common::Secret;
use serde::{Deserialize, Serialize};

use crate::{
    helpers::{
        check_length,
        validate_email,
        validate_password,
        validate_username,
        validate_wallet_address,
        ValidationError,
    },
    AccountApiError,
};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub count: Option<i64>,
}

impl Pagination {
    pub fn new(offset: i64, count: i64) -> Self {
        Self { offset: Some(offset), count: Some(count) }
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// The page size, clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        self.count.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

/// A sign-up request. The password is hashed before it reaches the database.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
}

impl Registration {
    pub fn new<S: Into<String>>(username: S, email: S, password: S) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: Secret::new(password.into()),
            display_name: None,
            wallet_address: None,
        }
    }

    pub fn with_wallet_address<S: Into<String>>(mut self, address: S) -> Self {
        self.wallet_address = Some(address.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_username(&self.username)?;
        validate_email(self.email.trim())?;
        validate_password(self.password.reveal())?;
        if let Some(name) = &self.display_name {
            check_length("display_name", name.trim(), 1, 64)?;
        }
        if let Some(address) = &self.wallet_address {
            validate_wallet_address(address)?;
        }
        Ok(())
    }
}

/// Changes a user can make to their own profile. `None` leaves a field untouched.
/// An empty string for `wallet_address` or `bio` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub wallet_address: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.wallet_address.is_none() && self.bio.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.display_name {
            check_length("display_name", name.trim(), 1, 64)?;
        }
        if let Some(address) = self.wallet_address.as_deref().filter(|a| !a.is_empty()) {
            validate_wallet_address(address)?;
        }
        if let Some(bio) = &self.bio {
            check_length("bio", bio, 0, 2_000)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQueryFilter {
    /// Substring match on username, email or display name
    pub q: Option<String>,
    pub disabled: Option<bool>,
}

impl UserQueryFilter {
    pub fn with_query<S: Into<String>>(mut self, q: S) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

impl From<ValidationError> for AccountApiError {
    fn from(e: ValidationError) -> Self {
        AccountApiError::ValidationError(e.to_string())
    }
}
