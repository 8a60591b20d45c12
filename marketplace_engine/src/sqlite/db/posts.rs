//! Localized blog posts.
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use super::unique_violation;
use crate::{
    db_types::Post,
    mkt_api::{
        account_objects::Pagination,
        blog_objects::{NewPost, PostQueryFilter, PostUpdate},
    },
    traits::BlogApiError,
};

fn map_slug_clash(e: sqlx::Error) -> BlogApiError {
    match unique_violation(&e) {
        Some(_) => BlogApiError::SlugTaken,
        None => BlogApiError::from(e),
    }
}

pub async fn insert_post(author_id: i64, post: NewPost, conn: &mut SqliteConnection) -> Result<Post, BlogApiError> {
    sqlx::query_as(
        r#"INSERT INTO posts (slug, locale, title, summary, body, published, author_id, published_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $6 THEN CURRENT_TIMESTAMP END)
           RETURNING *"#,
    )
    .bind(post.slug)
    .bind(post.locale)
    .bind(post.title.trim().to_string())
    .bind(post.summary)
    .bind(post.body)
    .bind(post.published)
    .bind(author_id)
    .fetch_one(conn)
    .await
    .map_err(map_slug_clash)
}

pub async fn fetch_post(post_id: i64, conn: &mut SqliteConnection) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM posts WHERE id = $1").bind(post_id).fetch_optional(conn).await
}

pub async fn fetch_post_by_slug(
    slug: &str,
    locale: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM posts WHERE slug = $1 AND locale = $2")
        .bind(slug)
        .bind(locale)
        .fetch_optional(conn)
        .await
}

/// `published_at` is stamped the first time the post is published and is kept if the post is later unpublished.
pub async fn update_post(
    post_id: i64,
    update: PostUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Post>, BlogApiError> {
    let mut builder = QueryBuilder::new("UPDATE posts SET ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    if let Some(slug) = update.slug {
        set_clause.push("slug = ");
        set_clause.push_bind_unseparated(slug);
    }
    if let Some(locale) = update.locale {
        set_clause.push("locale = ");
        set_clause.push_bind_unseparated(locale);
    }
    if let Some(title) = update.title {
        set_clause.push("title = ");
        set_clause.push_bind_unseparated(title.trim().to_string());
    }
    if let Some(summary) = update.summary {
        set_clause.push("summary = ");
        set_clause.push_bind_unseparated(Some(summary).filter(|s| !s.is_empty()));
    }
    if let Some(body) = update.body {
        set_clause.push("body = ");
        set_clause.push_bind_unseparated(body);
    }
    if let Some(published) = update.published {
        set_clause.push("published = ");
        set_clause.push_bind_unseparated(published);
        if published {
            set_clause.push("published_at = COALESCE(published_at, CURRENT_TIMESTAMP)");
        }
    }
    builder.push(" WHERE id = ");
    builder.push_bind(post_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Post>().fetch_optional(conn).await.map_err(map_slug_clash)
}

pub async fn delete_post(post_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM posts WHERE id = $1").bind(post_id).execute(conn).await?;
    Ok(res.rows_affected() > 0)
}

pub async fn search_posts(
    filter: PostQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Post>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM posts ");
    if filter.locale.is_some() || filter.published_only {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(locale) = filter.locale {
        where_clause.push("locale = ");
        where_clause.push_bind_unseparated(locale);
    }
    if filter.published_only {
        where_clause.push("published = 1");
    }
    builder.push(" ORDER BY COALESCE(published_at, created_at) DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    builder.build_query_as::<Post>().fetch_all(conn).await
}
