use thiserror::Error;

use crate::db_types::{NewUser, Role, User};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The username is already taken")]
    UsernameTaken,
    #[error("The email address is already registered")]
    EmailTaken,
    #[error("Invalid username, email or password")]
    InvalidCredentials,
    #[error("This account has been disabled")]
    AccountDisabled,
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Role not found")]
    RoleNotFound,
    #[error("{0}")]
    ValidationError(String),
    #[error("Could not hash password. {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// The `AuthManagement` trait defines behaviour for managing authentication and authorisation.
///
/// Passwords are hashed before they reach the backend; this trait only ever sees and stores the hash. Issuing and
/// checking access tokens happens at the server level.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Inserts a new user and grants it the [`Role::User`] role in a single transaction.
    ///
    /// Usernames and email addresses are unique (case-insensitively). A clash results in
    /// [`AuthApiError::UsernameTaken`] or [`AuthApiError::EmailTaken`].
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Looks a user up by username or email address, for the purpose of logging in.
    async fn fetch_user_for_login(&self, login: &str) -> Result<Option<User>, AuthApiError>;

    /// Fetches the user record, including the password hash.
    async fn fetch_login_record(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;

    /// Stamps `last_login_at` for the user.
    async fn record_login(&self, user_id: i64) -> Result<(), AuthApiError>;

    /// Fetches the roles for the given user. If the user is not found, the request still succeeds and returns an
    /// empty vector.
    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;

    /// Assigns the given roles to the user. This function must be idempotent.
    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;

    /// Removes the given roles from the user. The number of roles actually removed is returned. This function must
    /// be idempotent.
    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), AuthApiError>;
}
