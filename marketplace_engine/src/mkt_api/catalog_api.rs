//! Listings and their moderation.
//!
//! | action            | from                        | to              | who   |
//! |-------------------|-----------------------------|-----------------|-------|
//! | create            | -                           | draft           | user  |
//! | edit              | draft, rejected, off_shelf  | (unchanged)     | owner |
//! | submit for review | draft, rejected, off_shelf  | pending_review  | owner |
//! | approve / reject  | pending_review              | approved / rejected | admin |
//! | unlist            | approved                    | off_shelf       | owner |
//! | takedown          | approved, pending_review    | off_shelf       | admin |
//! | delete            | draft, rejected             | (removed)       | owner, if no orders exist |
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, Product, ProductStatus, PublicProduct},
    events::{EventProducers, ProductReviewedEvent},
    helpers::ValidationError,
    mkt_api::{
        account_objects::Pagination,
        catalog_objects::{NewProduct, ProductQueryFilter, ProductTransition, ProductUpdate, ReviewDecision},
    },
    traits::{CatalogError, CatalogManagement},
};

pub struct CatalogApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl From<ValidationError> for CatalogError {
    fn from(e: ValidationError) -> Self {
        CatalogError::ValidationError(e.to_string())
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Validates the listing and stores it as a `draft` owned by `seller_id`.
    pub async fn create_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError> {
        let product = product.normalize()?;
        let product = self.db.insert_product(seller_id, product).await?;
        info!("📦️ Seller #{seller_id} created listing #{} '{}'", product.id, product.title);
        Ok(product)
    }

    /// The catalog view of an approved listing. Any other listing is reported as not found.
    pub async fn public_product(&self, product_id: i64) -> Result<PublicProduct, CatalogError> {
        self.db.fetch_public_product(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))
    }

    pub async fn browse(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Vec<PublicProduct>, CatalogError> {
        self.db.search_public_products(filter, pagination).await
    }

    pub async fn products_for_seller(&self, seller_id: i64) -> Result<Vec<Product>, CatalogError> {
        self.db.fetch_products_for_seller(seller_id).await
    }

    /// The full listing, including the delivery content. Only the seller and admins may see it.
    pub async fn product_for_actor(&self, actor: &Actor, product_id: i64) -> Result<Product, CatalogError> {
        let product = self.fetch(product_id).await?;
        if !actor.is_admin && !actor.is(product.seller_id) {
            return Err(CatalogError::NotOwner);
        }
        Ok(product)
    }

    pub async fn update_product(
        &self,
        seller_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let product = self.owned(seller_id, product_id).await?;
        check_status(&product, &ProductStatus::EDITABLE, "edited")?;
        let update = update.normalize()?;
        if update.is_empty() {
            debug!("📦️ Empty update for listing #{product_id}. Nothing to do.");
            return Ok(product);
        }
        match self.db.update_product(product_id, &ProductStatus::EDITABLE, update).await? {
            Some(p) => Ok(p),
            None => Err(self.missed_transition(product_id, &ProductStatus::EDITABLE, "edited").await),
        }
    }

    pub async fn submit_for_review(&self, seller_id: i64, product_id: i64) -> Result<Product, CatalogError> {
        let product = self.owned(seller_id, product_id).await?;
        let transition = ProductTransition::new(&ProductStatus::SUBMITTABLE, ProductStatus::PendingReview);
        let product = self.apply(&product, transition, "submitted for review").await?;
        info!("📦️ Listing #{product_id} submitted for review");
        Ok(product)
    }

    pub async fn unlist(&self, seller_id: i64, product_id: i64) -> Result<Product, CatalogError> {
        let product = self.owned(seller_id, product_id).await?;
        let transition = ProductTransition::new(&[ProductStatus::Approved], ProductStatus::OffShelf);
        let product = self.apply(&product, transition, "unlisted").await?;
        info!("📦️ Listing #{product_id} unlisted by its seller");
        Ok(product)
    }

    /// Deletes a draft or rejected listing. Listings that have ever been ordered cannot be deleted.
    pub async fn delete_product(&self, seller_id: i64, product_id: i64) -> Result<(), CatalogError> {
        let product = self.owned(seller_id, product_id).await?;
        check_status(&product, &ProductStatus::DELETABLE, "deleted")?;
        if self.db.delete_product(product_id, &ProductStatus::DELETABLE).await? {
            info!("📦️ Listing #{product_id} deleted by its seller");
            Ok(())
        } else {
            Err(self.missed_transition(product_id, &ProductStatus::DELETABLE, "deleted").await)
        }
    }

    /// Approves or rejects a listing that is pending review. A rejection must say why; an approval clears any
    /// earlier note.
    pub async fn review_product(
        &self,
        admin_id: i64,
        product_id: i64,
        decision: ReviewDecision,
    ) -> Result<Product, CatalogError> {
        let product = self.fetch(product_id).await?;
        let (to, note, action) = if decision.approve {
            (ProductStatus::Approved, None, "approved")
        } else {
            let note = decision.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            let note = note.ok_or_else(|| ValidationError::new("note", "a rejection must include a note"))?;
            (ProductStatus::Rejected, Some(note), "rejected")
        };
        let transition = ProductTransition::new(&[ProductStatus::PendingReview], to).reviewed_by(admin_id, note);
        let product = self.apply(&product, transition, action).await?;
        info!("📦️ Listing #{product_id} {action} by admin #{admin_id}");
        let event = ProductReviewedEvent::new(product.clone(), admin_id, decision.approve);
        self.producers.publish_product_reviewed(event).await;
        Ok(product)
    }

    /// Removes a listing from sale, or from the review queue.
    pub async fn takedown(
        &self,
        admin_id: i64,
        product_id: i64,
        note: Option<String>,
    ) -> Result<Product, CatalogError> {
        let product = self.fetch(product_id).await?;
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let transition = ProductTransition::new(
            &[ProductStatus::Approved, ProductStatus::PendingReview],
            ProductStatus::OffShelf,
        )
        .reviewed_by(admin_id, note);
        let product = self.apply(&product, transition, "taken down").await?;
        warn!("📦️ Listing #{product_id} taken down by admin #{admin_id}");
        Ok(product)
    }

    /// The moderation queue. Defaults to listings that are pending review, oldest first.
    pub async fn review_queue(
        &self,
        statuses: Option<Vec<ProductStatus>>,
        pagination: Pagination,
    ) -> Result<Vec<Product>, CatalogError> {
        let statuses = statuses.filter(|s| !s.is_empty()).unwrap_or_else(|| vec![ProductStatus::PendingReview]);
        self.db.fetch_products_by_status(&statuses, pagination).await
    }

    async fn fetch(&self, product_id: i64) -> Result<Product, CatalogError> {
        self.db.fetch_product(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))
    }

    async fn owned(&self, seller_id: i64, product_id: i64) -> Result<Product, CatalogError> {
        let product = self.fetch(product_id).await?;
        if product.seller_id != seller_id {
            return Err(CatalogError::NotOwner);
        }
        Ok(product)
    }

    async fn apply(
        &self,
        product: &Product,
        transition: ProductTransition,
        action: &str,
    ) -> Result<Product, CatalogError> {
        check_status(product, &transition.from, action)?;
        let from = transition.from.clone();
        match self.db.transition_product(product.id, transition).await? {
            Some(p) => Ok(p),
            None => Err(self.missed_transition(product.id, &from, action).await),
        }
    }

    /// Works out why a conditional update touched no rows. A moderator who loses a race sees the listing in its new
    /// status, so the usual answer is `IllegalTransition`.
    async fn missed_transition(&self, product_id: i64, from: &[ProductStatus], action: &str) -> CatalogError {
        match self.db.fetch_product(product_id).await {
            Ok(None) => CatalogError::ProductNotFound(product_id),
            Ok(Some(p)) if from.contains(&p.status) => CatalogError::Conflict,
            Ok(Some(p)) => CatalogError::IllegalTransition { from: p.status, action: action.to_string() },
            Err(e) => e,
        }
    }
}

fn check_status(product: &Product, allowed: &[ProductStatus], action: &str) -> Result<(), CatalogError> {
    if allowed.contains(&product.status) {
        Ok(())
    } else {
        Err(CatalogError::IllegalTransition { from: product.status, action: action.to_string() })
    }
}
