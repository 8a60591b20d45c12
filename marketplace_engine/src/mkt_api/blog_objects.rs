use serde::{Deserialize, Serialize};

use crate::helpers::{check_length, validate_locale, validate_slug, ValidationError};

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPost {
    pub slug: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

impl NewPost {
    pub fn new<S: Into<String>>(slug: S, title: S, body: S) -> Self {
        Self {
            slug: slug.into(),
            locale: default_locale(),
            title: title.into(),
            summary: None,
            body: body.into(),
            published: false,
        }
    }

    pub fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn published(mut self) -> Self {
        self.published = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_slug(&self.slug)?;
        validate_locale(&self.locale)?;
        check_length("title", self.title.trim(), 1, 200)?;
        if let Some(summary) = &self.summary {
            check_length("summary", summary, 0, 500)?;
        }
        check_length("body", &self.body, 1, 100_000)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostUpdate {
    pub slug: Option<String>,
    pub locale: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub published: Option<bool>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none() &&
            self.locale.is_none() &&
            self.title.is_none() &&
            self.summary.is_none() &&
            self.body.is_none() &&
            self.published.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        if let Some(locale) = &self.locale {
            validate_locale(locale)?;
        }
        if let Some(title) = &self.title {
            check_length("title", title.trim(), 1, 200)?;
        }
        if let Some(summary) = &self.summary {
            check_length("summary", summary, 0, 500)?;
        }
        if let Some(body) = &self.body {
            check_length("body", body, 1, 100_000)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostQueryFilter {
    pub locale: Option<String>,
    /// When true, drafts are excluded
    #[serde(default)]
    pub published_only: bool,
}

impl PostQueryFilter {
    pub fn published() -> Self {
        Self { locale: None, published_only: true }
    }

    pub fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = Some(locale.into());
        self
    }
}
