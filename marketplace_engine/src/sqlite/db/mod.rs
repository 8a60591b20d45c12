//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    Sqlite,
    SqlitePool,
    Transaction,
};

pub mod analytics;
pub mod auth;
pub mod orders;
pub mod posts;
pub mod products;
pub mod stats;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/marketplace.db";

/// SQLITE_CONSTRAINT_UNIQUE
const UNIQUE_VIOLATION: &str = "2067";
/// SQLITE_CONSTRAINT_TRIGGER, i.e. a `RAISE(ABORT, ...)` from one of the guard triggers
const TRIGGER_VIOLATION: &str = "1811";

pub fn db_url() -> String {
    let result = env::var("MKT_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MKT_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Begins a transaction that takes the write lock straight away, which is what `BEGIN IMMEDIATE` does.
///
/// In WAL mode, a deferred transaction that reads and then writes fails with `SQLITE_BUSY_SNAPSHOT` if another
/// connection committed in between, and the busy timeout does not apply to that error. Use this for read-check-write
/// sequences.
///
/// sqlx always opens transactions with a plain `BEGIN`, so the first statement is a no-op write to the `write_lock`
/// table. Any write statement acquires SQLite's RESERVED lock, and the lock is held until the transaction ends.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, SqlxError> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE write_lock SET id = id WHERE id = 1").execute(&mut *tx).await?;
    Ok(tx)
}

/// If the error is a unique constraint violation, returns the error message, which names the offending columns.
pub(crate) fn unique_violation(e: &SqlxError) -> Option<String> {
    match e {
        SqlxError::Database(de) if de.code().as_deref() == Some(UNIQUE_VIOLATION) => Some(de.message().to_string()),
        _ => None,
    }
}

/// True if the error came from one of the `RAISE(ABORT)` guard triggers.
pub(crate) fn is_trigger_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(de) if de.code().as_deref() == Some(TRIGGER_VIOLATION))
}

/// Builds a `'a','b'` list for an `IN (...)` clause. Only ever called with enum values, whose string forms are fixed.
pub(crate) fn in_list<T: ToString>(values: &[T]) -> String {
    values.iter().map(|v| format!("'{}'", v.to_string())).collect::<Vec<String>>().join(",")
}
