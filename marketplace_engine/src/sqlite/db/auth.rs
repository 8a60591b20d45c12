//! Sqlite database operations for roles and role assignments.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`AuthManagement`] trait methods
//! that are implemented on the [`SqliteDatabase`] struct instead.
use std::collections::HashMap;

use log::debug;
use sqlx::{QueryBuilder, Row, SqliteConnection};

use crate::{db_types::Role, traits::AuthApiError};

pub async fn roles_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Role>, AuthApiError> {
    let rows = sqlx::query(
        r#"SELECT name FROM
            role_assignments LEFT JOIN roles ON role_assignments.role_id = roles.id
            WHERE user_id = ? ORDER BY roles.id"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    let roles = rows
        .iter()
        .map(|r| r.try_get::<String, _>("name"))
        .collect::<Result<Vec<String>, _>>()?
        .iter()
        .map(|name| name.parse::<Role>().map_err(|_| AuthApiError::RoleNotFound))
        .collect::<Result<Vec<Role>, _>>()?;
    Ok(roles)
}

async fn fetch_roles(conn: &mut SqliteConnection) -> Result<HashMap<Role, i64>, AuthApiError> {
    let rows = sqlx::query("SELECT id, name FROM roles").fetch_all(conn).await?;
    let roles = rows
        .iter()
        .map(|r| {
            let id: i64 = r.try_get("id")?;
            let name: String = r.try_get("name")?;
            Ok((name, id))
        })
        .collect::<Result<Vec<(String, i64)>, sqlx::Error>>()?
        .into_iter()
        .map(|(name, id)| name.parse::<Role>().map(|role| (role, id)).map_err(|_| AuthApiError::RoleNotFound))
        .collect::<Result<HashMap<_, _>, _>>()?;
    debug!("🔑️ Fetched current roles table: {roles:?}");
    Ok(roles)
}

pub async fn assign_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let all_roles = fetch_roles(conn).await?;
    let role_ids = roles
        .iter()
        .map(|r| all_roles.get(r).ok_or(AuthApiError::RoleNotFound).copied())
        .collect::<Result<Vec<i64>, _>>()?;

    let mut qb = QueryBuilder::new("INSERT INTO role_assignments (user_id, role_id) VALUES ");
    let mut values = qb.separated(", ");
    for role_id in role_ids {
        values.push("(");
        values.push_bind_unseparated(user_id);
        values.push_unseparated(", ");
        values.push_bind_unseparated(role_id);
        values.push_unseparated(")");
    }
    qb.push(" ON CONFLICT DO NOTHING");
    let res = qb.build().execute(conn).await.map_err(|e| match e {
        sqlx::Error::Database(de) if de.is_foreign_key_violation() => AuthApiError::UserNotFound(user_id),
        e => AuthApiError::from(e),
    })?;
    debug!("🔑️ {} new roles assigned to user #{user_id}", res.rows_affected());
    Ok(())
}

pub async fn remove_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    if roles.is_empty() {
        return Ok(0);
    }
    let all_roles = fetch_roles(conn).await?;
    let mut qb = QueryBuilder::new("DELETE FROM role_assignments WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND role_id IN (");
    let mut ids = qb.separated(", ");
    for role in roles {
        let id = all_roles.get(role).ok_or(AuthApiError::RoleNotFound)?;
        ids.push_bind(*id);
    }
    qb.push(")");
    let res = qb.build().execute(conn).await?;
    debug!("🔑️ {} roles removed from user #{user_id}", res.rows_affected());
    Ok(res.rows_affected())
}
