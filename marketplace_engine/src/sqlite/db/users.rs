//! User records and profiles.
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use super::{auth::roles_for_user, unique_violation};
use crate::{
    db_types::{NewUser, User, UserWithRoles},
    mkt_api::account_objects::{Pagination, ProfileUpdate, UserQueryFilter},
    traits::{AccountApiError, AuthApiError},
};

/// Inserts the user. This is not atomic; wrap it in a transaction along with the role assignment.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let result = sqlx::query_as(
        r#"INSERT INTO users (username, email, password_hash, display_name, wallet_address)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING *"#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.display_name)
    .bind(user.wallet_address)
    .fetch_one(conn)
    .await;
    result.map_err(|e| match unique_violation(&e) {
        Some(msg) if msg.contains("users.email") => AuthApiError::EmailTaken,
        Some(_) => AuthApiError::UsernameTaken,
        None => AuthApiError::from(e),
    })
}

pub async fn fetch_user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

/// Usernames and emails are compared case-insensitively (the columns are `COLLATE NOCASE`).
pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE username = $1 OR email = $1 LIMIT 1")
        .bind(login.trim())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_user_with_roles(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<UserWithRoles>, AccountApiError> {
    let Some(user) = fetch_user_by_id(user_id, &mut *conn).await? else {
        return Ok(None);
    };
    let roles = roles_for_user(user.id, conn).await.map_err(|e| AccountApiError::DatabaseError(e.to_string()))?;
    Ok(Some(UserWithRoles::new(user, roles)))
}

pub async fn record_login(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = CURRENT_TIMESTAMP WHERE id = $1").bind(user_id).execute(conn).await?;
    Ok(())
}

pub async fn update_password_hash(
    user_id: i64,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    let res = sqlx::query("UPDATE users SET password_hash = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(conn)
        .await?;
    match res.rows_affected() {
        0 => Err(AuthApiError::UserNotFound(user_id)),
        _ => Ok(()),
    }
}

/// Updates the profile fields that are present in `update`. Returns `None` if the user does not exist.
pub async fn update_profile(
    user_id: i64,
    update: ProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for user {user_id}. Update request skipped.");
        return fetch_user_by_id(user_id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE users SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.display_name {
        set_clause.push("display_name = ");
        set_clause.push_bind_unseparated(name.trim().to_string());
    }
    if let Some(address) = update.wallet_address {
        set_clause.push("wallet_address = ");
        set_clause.push_bind_unseparated(Some(address).filter(|a| !a.is_empty()));
    }
    if let Some(bio) = update.bio {
        set_clause.push("bio = ");
        set_clause.push_bind_unseparated(Some(bio).filter(|b| !b.is_empty()));
    }
    builder.push(" WHERE id = ");
    builder.push_bind(user_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<User>().fetch_optional(conn).await
}

pub async fn set_disabled(user_id: i64, disabled: bool, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("UPDATE users SET disabled = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(disabled)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn search_users(
    filter: UserQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM users ");
    if filter.q.is_some() || filter.disabled.is_some() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(q) = filter.q {
        let pattern = format!("%{q}%");
        where_clause.push("(username LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" OR email LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" OR display_name LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(")");
    }
    if let Some(disabled) = filter.disabled {
        where_clause.push("disabled = ");
        where_clause.push_bind_unseparated(disabled);
    }
    builder.push(" ORDER BY id ASC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<User>().fetch_all(conn).await
}

pub async fn count_users(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(conn).await
}
