use mkt_common::{normalize_currency, MicroUnits, DEFAULT_CURRENCY_CODE};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{DeliveryType, ProductCategory, ProductStatus},
    helpers::{check_length, ValidationError},
};

pub const MAX_TAGS: usize = 10;

/// A listing as submitted by a seller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub category: ProductCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: MicroUnits,
    #[serde(default)]
    pub currency: Option<String>,
    pub delivery_type: DeliveryType,
    pub delivery_content: String,
    #[serde(default)]
    pub preview: Option<String>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(
        title: S,
        category: ProductCategory,
        price: MicroUnits,
        delivery_type: DeliveryType,
        delivery_content: S,
    ) -> Self {
        Self {
            title: title.into(),
            summary: String::new(),
            description: String::new(),
            category,
            tags: Vec::new(),
            price,
            currency: None,
            delivery_type,
            delivery_content: delivery_content.into(),
            preview: None,
        }
    }

    pub fn with_summary<S: Into<String>>(mut self, summary: S) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Validates the listing and returns it with its currency and tags normalised.
    pub fn normalize(mut self) -> Result<Self, ValidationError> {
        self.title = self.title.trim().to_string();
        check_length("title", &self.title, 3, 120)?;
        check_length("summary", &self.summary, 0, 280)?;
        check_length("description", &self.description, 0, 20_000)?;
        check_price(self.price)?;
        let currency = self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY_CODE);
        let currency = normalize_currency(currency).map_err(|e| ValidationError::new("currency", e.to_string()))?;
        self.currency = Some(currency);
        check_delivery_content(&self.delivery_content)?;
        self.tags = normalize_tags(self.tags)?;
        if let Some(preview) = &self.preview {
            check_length("preview", preview, 0, 4_000)?;
        }
        Ok(self)
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY_CODE)
    }
}

/// A partial edit of a listing. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub tags: Option<Vec<String>>,
    pub price: Option<MicroUnits>,
    pub currency: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub delivery_content: Option<String>,
    pub preview: Option<String>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() &&
            self.summary.is_none() &&
            self.description.is_none() &&
            self.category.is_none() &&
            self.tags.is_none() &&
            self.price.is_none() &&
            self.currency.is_none() &&
            self.delivery_type.is_none() &&
            self.delivery_content.is_none() &&
            self.preview.is_none()
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_price(mut self, price: MicroUnits) -> Self {
        self.price = Some(price);
        self
    }

    pub fn normalize(mut self) -> Result<Self, ValidationError> {
        if let Some(title) = self.title.take() {
            let title = title.trim().to_string();
            check_length("title", &title, 3, 120)?;
            self.title = Some(title);
        }
        if let Some(summary) = &self.summary {
            check_length("summary", summary, 0, 280)?;
        }
        if let Some(description) = &self.description {
            check_length("description", description, 0, 20_000)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(currency) = self.currency.take() {
            let currency = normalize_currency(&currency).map_err(|e| ValidationError::new("currency", e.to_string()))?;
            self.currency = Some(currency);
        }
        if let Some(content) = &self.delivery_content {
            check_delivery_content(content)?;
        }
        if let Some(tags) = self.tags.take() {
            self.tags = Some(normalize_tags(tags)?);
        }
        if let Some(preview) = &self.preview {
            check_length("preview", preview, 0, 4_000)?;
        }
        Ok(self)
    }
}

fn check_price(price: MicroUnits) -> Result<(), ValidationError> {
    if price.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::new("price", "must be greater than zero"))
    }
}

fn check_delivery_content(content: &str) -> Result<(), ValidationError> {
    check_length("delivery_content", content.trim(), 1, 4_000)
}

fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("tags", format!("at most {MAX_TAGS} tags are allowed")));
    }
    let mut result: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        check_length("tags", &tag, 1, 32)?;
        if !result.contains(&tag) {
            result.push(tag);
        }
    }
    Ok(result)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Catalog search criteria. Only approved listings are ever returned from a catalog search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQueryFilter {
    pub category: Option<ProductCategory>,
    /// Case-insensitive substring match on title and summary
    pub q: Option<String>,
    /// Seller username
    pub seller: Option<String>,
    pub currency: Option<String>,
    pub min_price: Option<MicroUnits>,
    pub max_price: Option<MicroUnits>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductQueryFilter {
    pub fn with_category(mut self, category: ProductCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_query<S: Into<String>>(mut self, q: S) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_seller<S: Into<String>>(mut self, seller: S) -> Self {
        self.seller = Some(seller.into());
        self
    }

    pub fn with_sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_price_range(mut self, min: Option<MicroUnits>, max: Option<MicroUnits>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }
}

/// An admin's verdict on a listing that is pending review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDecision {
    pub approve: bool,
    pub note: Option<String>,
}

impl ReviewDecision {
    pub fn approve() -> Self {
        Self { approve: true, note: None }
    }

    pub fn reject<S: Into<String>>(note: S) -> Self {
        Self { approve: false, note: Some(note.into()) }
    }
}

/// A conditional listing status change, applied by the backend only if the listing is in one of the `from` states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductTransition {
    pub from: Vec<ProductStatus>,
    pub to: ProductStatus,
    /// Set for review and takedown actions. The reviewer and note are stored on the listing.
    pub reviewer_id: Option<i64>,
    pub review_note: Option<String>,
}

impl ProductTransition {
    pub fn new(from: &[ProductStatus], to: ProductStatus) -> Self {
        Self { from: from.to_vec(), to, reviewer_id: None, review_note: None }
    }

    pub fn reviewed_by(mut self, reviewer_id: i64, note: Option<String>) -> Self {
        self.reviewer_id = Some(reviewer_id);
        self.review_note = note;
        self
    }
}
