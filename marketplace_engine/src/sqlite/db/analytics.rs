//! Tracking events.
use chrono::{DateTime, Utc};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::AnalyticsEvent,
    mkt_api::{
        account_objects::Pagination,
        analytics_objects::{EventCount, NewAnalyticsEvent},
    },
};

pub async fn insert_event(
    event: NewAnalyticsEvent,
    conn: &mut SqliteConnection,
) -> Result<AnalyticsEvent, sqlx::Error> {
    sqlx::query_as(
        r#"INSERT INTO analytics_events (name, path, user_id, session_id, ip_address, properties)
           VALUES ($1, $2, $3, $4, $5, $6)
           RETURNING *"#,
    )
    .bind(event.name)
    .bind(event.path)
    .bind(event.user_id)
    .bind(event.session_id)
    .bind(event.ip_address)
    .bind(Json(event.properties))
    .fetch_one(conn)
    .await
}

pub async fn event_counts(
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Vec<EventCount>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT name, COUNT(*) AS count FROM analytics_events ");
    if since.is_some() || until.is_some() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(since) = since {
        where_clause.push("unixepoch(created_at) >= ");
        where_clause.push_bind_unseparated(since.timestamp());
    }
    if let Some(until) = until {
        where_clause.push("unixepoch(created_at) <= ");
        where_clause.push_bind_unseparated(until.timestamp());
    }
    builder.push(" GROUP BY name ORDER BY count DESC, name ASC");
    builder.build_query_as::<EventCount>().fetch_all(conn).await
}

pub async fn recent_events(
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<AnalyticsEvent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM analytics_events ORDER BY id DESC LIMIT $1 OFFSET $2")
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(conn)
        .await
}
