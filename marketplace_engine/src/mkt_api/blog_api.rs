//! Localized blog posts and content pages.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::Post,
    helpers::ValidationError,
    mkt_api::{
        account_objects::Pagination,
        blog_objects::{NewPost, PostQueryFilter, PostUpdate, DEFAULT_LOCALE},
    },
    traits::{BlogApiError, BlogManagement},
};

pub struct BlogApi<B> {
    db: B,
}

impl<B: Debug> Debug for BlogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlogApi ({:?})", self.db)
    }
}

impl From<ValidationError> for BlogApiError {
    fn from(e: ValidationError) -> Self {
        BlogApiError::ValidationError(e.to_string())
    }
}

impl<B> BlogApi<B>
where B: BlogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub async fn create_post(&self, author_id: i64, post: NewPost) -> Result<Post, BlogApiError> {
        post.validate()?;
        let post = self.db.insert_post(author_id, post).await?;
        info!("📝️ Post #{} ({}/{}) created by user #{author_id}", post.id, post.locale, post.slug);
        Ok(post)
    }

    /// Applies a partial update. Publishing a post for the first time sets its publication date; unpublishing and
    /// republishing keeps the original date.
    pub async fn update_post(&self, post_id: i64, update: PostUpdate) -> Result<Post, BlogApiError> {
        update.validate()?;
        if update.is_empty() {
            return self.db.fetch_post(post_id).await?.ok_or(BlogApiError::PostNotFound);
        }
        let post = self.db.update_post(post_id, update).await?.ok_or(BlogApiError::PostNotFound)?;
        debug!("📝️ Post #{post_id} updated");
        Ok(post)
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<(), BlogApiError> {
        if self.db.delete_post(post_id).await? {
            info!("📝️ Post #{post_id} deleted");
            Ok(())
        } else {
            Err(BlogApiError::PostNotFound)
        }
    }

    /// Every post, drafts included.
    pub async fn all_posts(&self, locale: Option<String>, pagination: Pagination) -> Result<Vec<Post>, BlogApiError> {
        let filter = PostQueryFilter { locale, published_only: false };
        self.db.search_posts(filter, pagination).await
    }

    pub async fn published_posts(
        &self,
        locale: Option<String>,
        pagination: Pagination,
    ) -> Result<Vec<Post>, BlogApiError> {
        let filter = PostQueryFilter { locale, published_only: true };
        self.db.search_posts(filter, pagination).await
    }

    /// Fetches a published post. Drafts are reported as missing.
    pub async fn published_post(&self, slug: &str, locale: Option<&str>) -> Result<Post, BlogApiError> {
        let locale = locale.unwrap_or(DEFAULT_LOCALE);
        match self.db.fetch_post_by_slug(slug, locale).await? {
            Some(post) if post.published => Ok(post),
            _ => Err(BlogApiError::PostNotFound),
        }
    }
}
