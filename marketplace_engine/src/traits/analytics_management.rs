use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::AnalyticsEvent,
    mkt_api::{
        account_objects::Pagination,
        analytics_objects::{EventCount, NewAnalyticsEvent},
    },
};

#[derive(Debug, Clone, Error)]
pub enum AnalyticsError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for AnalyticsError {
    fn from(e: sqlx::Error) -> Self {
        AnalyticsError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AnalyticsManagement {
    async fn insert_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AnalyticsError>;

    /// Number of events per name in the given window, most frequent first.
    async fn event_counts(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventCount>, AnalyticsError>;

    /// The most recent events, newest first.
    async fn recent_events(&self, pagination: Pagination) -> Result<Vec<AnalyticsEvent>, AnalyticsError>;
}
