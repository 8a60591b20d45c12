//! Aggregates for the admin dashboard.
use chrono::{Duration, Utc};
use sqlx::SqliteConnection;

use crate::mkt_api::stats_objects::{CurrencyVolume, StatusCount};

pub async fn product_counts(conn: &mut SqliteConnection) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as("SELECT status, COUNT(*) AS count FROM products GROUP BY status ORDER BY status")
        .fetch_all(conn)
        .await
}

pub async fn order_counts(conn: &mut SqliteConnection) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as("SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status").fetch_all(conn).await
}

pub async fn completed_volume(conn: &mut SqliteConnection) -> Result<Vec<CurrencyVolume>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT currency, SUM(amount) AS volume, COUNT(*) AS orders
           FROM orders WHERE status = 'completed'
           GROUP BY currency ORDER BY currency"#,
    )
    .fetch_all(conn)
    .await
}

pub async fn orders_since(period: Duration, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let cutoff = (Utc::now() - period).timestamp();
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE unixepoch(created_at) >= $1")
        .bind(cutoff)
        .fetch_one(conn)
        .await
}
