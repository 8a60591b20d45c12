use thiserror::Error;

use crate::{
    db_types::Post,
    mkt_api::{
        account_objects::Pagination,
        blog_objects::{NewPost, PostQueryFilter, PostUpdate},
    },
};

#[derive(Debug, Clone, Error)]
pub enum BlogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested post does not exist")]
    PostNotFound,
    #[error("A post with this slug already exists for the locale")]
    SlugTaken,
    #[error("{0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for BlogApiError {
    fn from(e: sqlx::Error) -> Self {
        BlogApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait BlogManagement {
    /// Stores a post. If the post is published, `published_at` is set. A `(slug, locale)` clash results in
    /// [`BlogApiError::SlugTaken`].
    async fn insert_post(&self, author_id: i64, post: NewPost) -> Result<Post, BlogApiError>;

    async fn fetch_post(&self, post_id: i64) -> Result<Option<Post>, BlogApiError>;

    async fn fetch_post_by_slug(&self, slug: &str, locale: &str) -> Result<Option<Post>, BlogApiError>;

    /// Applies the update. `published_at` is only set the first time a post is published.
    async fn update_post(&self, post_id: i64, update: PostUpdate) -> Result<Option<Post>, BlogApiError>;

    async fn delete_post(&self, post_id: i64) -> Result<bool, BlogApiError>;

    /// Posts matching the filter. Published posts are ordered by publication date, newest first.
    async fn search_posts(&self, filter: PostQueryFilter, pagination: Pagination) -> Result<Vec<Post>, BlogApiError>;
}
