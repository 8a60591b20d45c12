use std::fmt::Debug;

use log::*;

use crate::{
    db_types::AnalyticsEvent,
    helpers::ValidationError,
    mkt_api::{
        account_objects::Pagination,
        analytics_objects::{AnalyticsQuery, EventCount, NewAnalyticsEvent},
    },
    traits::{AnalyticsError, AnalyticsManagement},
};

/// Records tracking events from clients and from the engine's own hooks, and summarises them for admins.
#[derive(Clone)]
pub struct AnalyticsApi<B> {
    db: B,
}

impl<B: Debug> Debug for AnalyticsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnalyticsApi ({:?})", self.db)
    }
}

impl From<ValidationError> for AnalyticsError {
    fn from(e: ValidationError) -> Self {
        AnalyticsError::ValidationError(e.to_string())
    }
}

impl<B> AnalyticsApi<B>
where B: AnalyticsManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn record_event(&self, event: NewAnalyticsEvent) -> Result<AnalyticsEvent, AnalyticsError> {
        event.validate()?;
        let event = self.db.insert_event(event).await?;
        trace!("📊️ Recorded event '{}' (#{})", event.name, event.id);
        Ok(event)
    }

    pub async fn summary(&self, query: AnalyticsQuery) -> Result<Vec<EventCount>, AnalyticsError> {
        if let (Some(since), Some(until)) = (query.since, query.until) {
            if since > until {
                return Err(ValidationError::new("since", "must not be later than 'until'").into());
            }
        }
        self.db.event_counts(query.since, query.until).await
    }

    pub async fn recent(&self, pagination: Pagination) -> Result<Vec<AnalyticsEvent>, AnalyticsError> {
        self.db.recent_events(pagination).await
    }
}
