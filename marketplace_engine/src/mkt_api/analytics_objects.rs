use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::helpers::{check_length, validate_event_name, ValidationError};

/// Largest accepted `properties` payload, in bytes of serialized JSON
pub const MAX_PROPERTIES_SIZE: usize = 4_096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalyticsEvent {
    pub name: String,
    pub path: Option<String>,
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub properties: serde_json::Value,
}

impl NewAnalyticsEvent {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            path: None,
            user_id: None,
            session_id: None,
            ip_address: None,
            properties: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_user_id(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_event_name(&self.name)?;
        if let Some(path) = &self.path {
            check_length("path", path, 1, 2_048)?;
        }
        if let Some(session) = &self.session_id {
            check_length("session_id", session, 1, 128)?;
        }
        if !self.properties.is_object() {
            return Err(ValidationError::new("properties", "must be a JSON object"));
        }
        if self.properties.to_string().len() > MAX_PROPERTIES_SIZE {
            return Err(ValidationError::new("properties", format!("may not exceed {MAX_PROPERTIES_SIZE} bytes")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct EventCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}
