use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, Role, User, UserWithRoles},
    helpers::{hash_password, validate_password, verify_password, PasswordError, ValidationError},
    mkt_api::account_objects::Registration,
    traits::{AuthApiError, AuthManagement},
};

/// `AuthApi` registers users, checks credentials and manages roles.
///
/// Issuing access tokens is left to the caller: a successful [`AuthApi::login`] returns the user and its roles, which
/// is everything a token needs.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl From<ValidationError> for AuthApiError {
    fn from(e: ValidationError) -> Self {
        AuthApiError::ValidationError(e.to_string())
    }
}

impl From<PasswordError> for AuthApiError {
    fn from(e: PasswordError) -> Self {
        AuthApiError::PasswordHashError(e.to_string())
    }
}

/// Argon2 is slow on purpose, so keep it off the async worker threads.
async fn hash_blocking(password: String) -> Result<String, AuthApiError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))??;
    Ok(hash)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthApiError> {
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))??;
    Ok(ok)
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Creates a new account with the `user` role.
    pub async fn register(&self, registration: Registration) -> Result<UserWithRoles, AuthApiError> {
        registration.validate()?;
        let password_hash = hash_blocking(registration.password.reveal().clone()).await?;
        let username = registration.username.trim().to_string();
        let display_name = registration
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());
        let new_user = NewUser {
            username,
            email: registration.email.trim().to_string(),
            password_hash,
            display_name,
            wallet_address: registration.wallet_address,
        };
        let user = self.db.create_user(new_user).await?;
        info!("🔑️ New user registered: #{} ({})", user.id, user.username);
        Ok(UserWithRoles::new(user, vec![Role::User]))
    }

    /// Checks the credentials and returns the user and its roles.
    ///
    /// An unknown login and a wrong password produce the same error. The disabled check only happens after the
    /// password has been verified, so that it does not reveal which accounts exist.
    pub async fn login(&self, login: &str, password: &str) -> Result<UserWithRoles, AuthApiError> {
        let user = self.db.fetch_user_for_login(login).await?.ok_or(AuthApiError::InvalidCredentials)?;
        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            debug!("🔑️ Failed login attempt for user #{}", user.id);
            return Err(AuthApiError::InvalidCredentials);
        }
        if user.disabled {
            info!("🔑️ Disabled user #{} tried to log in", user.id);
            return Err(AuthApiError::AccountDisabled);
        }
        self.db.record_login(user.id).await?;
        let roles = self.db.fetch_roles_for_user(user.id).await?;
        debug!("🔑️ User #{} logged in with roles {roles:?}", user.id);
        Ok(UserWithRoles::new(user, roles))
    }

    /// Replaces the password, after checking the current one.
    pub async fn change_password(&self, user_id: i64, current: &str, new_password: &str) -> Result<(), AuthApiError> {
        let user = self.db.fetch_login_record(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))?;
        if !verify_blocking(current.to_string(), user.password_hash).await? {
            return Err(AuthApiError::InvalidCredentials);
        }
        validate_password(new_password)?;
        let hash = hash_blocking(new_password.to_string()).await?;
        self.db.update_password_hash(user_id, &hash).await?;
        info!("🔑️ User #{user_id} changed their password");
        Ok(())
    }

    /// Returns the user if it exists and is not disabled. Used to re-check a token holder.
    pub async fn active_user(&self, user_id: i64) -> Result<User, AuthApiError> {
        let user = self.db.fetch_login_record(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))?;
        if user.disabled {
            return Err(AuthApiError::AccountDisabled);
        }
        Ok(user)
    }

    pub async fn roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        self.db.fetch_roles_for_user(user_id).await
    }

    pub async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        self.db.assign_roles(user_id, roles).await
    }

    pub async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        self.db.remove_roles(user_id, roles).await
    }

    /// Makes sure the configured admin account exists and holds the admin role. The password is only used when the
    /// account has to be created; an existing account keeps its password.
    pub async fn ensure_admin(&self, registration: Registration) -> Result<User, AuthApiError> {
        let user = match self.db.fetch_user_for_login(&registration.username).await? {
            Some(user) => user,
            None => {
                info!("🔑️ Creating bootstrap admin account '{}'", registration.username);
                self.register(registration).await?.user
            },
        };
        self.db.assign_roles(user.id, &[Role::User, Role::Admin]).await?;
        info!("🔑️ User #{} ({}) has admin rights", user.id, user.username);
        Ok(user)
    }
}
