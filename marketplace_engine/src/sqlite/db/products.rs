//! Catalog listings.
//!
//! Status changes are applied with a conditional `UPDATE ... WHERE status IN (...)`, so that two moderators (or a
//! moderator and the seller) racing on the same listing cannot both win.
use log::{debug, trace};
use mkt_common::normalize_currency;
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use super::in_list;
use crate::{
    db_types::{Product, ProductStatus, PublicProduct},
    mkt_api::{
        account_objects::Pagination,
        catalog_objects::{NewProduct, ProductQueryFilter, ProductSort, ProductTransition, ProductUpdate},
    },
    traits::CatalogError,
};

const PUBLIC_COLUMNS: &str = r#"
    SELECT p.id, p.seller_id, u.username AS seller_username, p.title, p.summary, p.description, p.category, p.tags,
           p.price, p.currency, p.delivery_type, p.preview, p.status, p.created_at, p.updated_at
    FROM products p JOIN users u ON u.id = p.seller_id
"#;

pub async fn insert_product(
    seller_id: i64,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let currency = product.currency().to_string();
    let product: Product = sqlx::query_as(
        r#"
        INSERT INTO products (
            seller_id, title, summary, description, category, tags, price, currency, delivery_type,
            delivery_content, preview
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *;
        "#,
    )
    .bind(seller_id)
    .bind(product.title)
    .bind(product.summary)
    .bind(product.description)
    .bind(product.category)
    .bind(Json(product.tags))
    .bind(product.price)
    .bind(currency)
    .bind(product.delivery_type)
    .bind(product.delivery_content)
    .bind(product.preview)
    .fetch_one(conn)
    .await?;
    debug!("📦️ Product #{} created for seller #{seller_id}", product.id);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await
}

pub async fn fetch_public_product(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PublicProduct>, sqlx::Error> {
    let q = format!("{PUBLIC_COLUMNS} WHERE p.id = $1 AND p.status = 'approved'");
    sqlx::query_as(&q).bind(product_id).fetch_optional(conn).await
}

/// Escapes the `LIKE` wildcards in user input so that they match literally. Pair with `ESCAPE '\'`.
fn escape_like(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len());
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Searches approved listings. Text search is a case-insensitive substring match on the title and summary.
pub async fn search_public_products(
    filter: ProductQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<PublicProduct>, CatalogError> {
    let mut builder = QueryBuilder::new(PUBLIC_COLUMNS);
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("p.status = 'approved'");
    if let Some(category) = filter.category {
        where_clause.push("p.category = ");
        where_clause.push_bind_unseparated(category);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        where_clause.push("(p.title LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR p.summary LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(" ESCAPE '\\')");
    }
    if let Some(seller) = filter.seller {
        where_clause.push("u.username = ");
        where_clause.push_bind_unseparated(seller);
    }
    if let Some(currency) = filter.currency {
        let currency = normalize_currency(&currency).map_err(|e| CatalogError::ValidationError(e.to_string()))?;
        where_clause.push("p.currency = ");
        where_clause.push_bind_unseparated(currency);
    }
    if let Some(min) = filter.min_price {
        where_clause.push("p.price >= ");
        where_clause.push_bind_unseparated(min);
    }
    if let Some(max) = filter.max_price {
        where_clause.push("p.price <= ");
        where_clause.push_bind_unseparated(max);
    }
    let order_by = match filter.sort {
        ProductSort::Newest => " ORDER BY p.created_at DESC, p.id DESC",
        ProductSort::PriceAsc => " ORDER BY p.price ASC, p.id ASC",
        ProductSort::PriceDesc => " ORDER BY p.price DESC, p.id DESC",
    };
    builder.push(order_by);
    builder.push(" LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("📦️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<PublicProduct>().fetch_all(conn).await?;
    trace!("📦️ Catalog search returned {} products", products.len());
    Ok(products)
}

pub async fn fetch_products_for_seller(
    seller_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE seller_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(seller_id)
        .fetch_all(conn)
        .await
}

/// Listings in the given statuses, least recently changed first.
pub async fn fetch_products_by_status(
    statuses: &[ProductStatus],
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM products ");
    if !statuses.is_empty() {
        builder.push(format!("WHERE status IN ({}) ", in_list(statuses)));
    }
    builder.push("ORDER BY updated_at ASC, id ASC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    builder.build_query_as::<Product>().fetch_all(conn).await
}

pub async fn update_product(
    product_id: i64,
    allowed: &[ProductStatus],
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE products SET ");
    let mut set_clause = builder.separated(", ");
    set_clause.push("updated_at = CURRENT_TIMESTAMP");
    if let Some(title) = update.title {
        set_clause.push("title = ");
        set_clause.push_bind_unseparated(title);
    }
    if let Some(summary) = update.summary {
        set_clause.push("summary = ");
        set_clause.push_bind_unseparated(summary);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ");
        set_clause.push_bind_unseparated(category);
    }
    if let Some(tags) = update.tags {
        set_clause.push("tags = ");
        set_clause.push_bind_unseparated(Json(tags));
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(currency) = update.currency {
        set_clause.push("currency = ");
        set_clause.push_bind_unseparated(currency);
    }
    if let Some(delivery_type) = update.delivery_type {
        set_clause.push("delivery_type = ");
        set_clause.push_bind_unseparated(delivery_type);
    }
    if let Some(content) = update.delivery_content {
        set_clause.push("delivery_content = ");
        set_clause.push_bind_unseparated(content);
    }
    if let Some(preview) = update.preview {
        set_clause.push("preview = ");
        set_clause.push_bind_unseparated(Some(preview).filter(|p| !p.is_empty()));
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    builder.push(format!(" AND status IN ({}) RETURNING *", in_list(allowed)));
    trace!("📦️ Executing query: {}", builder.sql());
    builder.build_query_as::<Product>().fetch_optional(conn).await
}

pub async fn transition_product(
    product_id: i64,
    transition: ProductTransition,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP, status = ");
    builder.push_bind(transition.to);
    if let Some(reviewer) = transition.reviewer_id {
        builder.push(", reviewed_at = CURRENT_TIMESTAMP, reviewed_by = ");
        builder.push_bind(reviewer);
        builder.push(", review_note = ");
        builder.push_bind(transition.review_note);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(product_id);
    builder.push(format!(" AND status IN ({}) RETURNING *", in_list(&transition.from)));
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    if let Some(p) = &product {
        debug!("📦️ Product #{product_id} is now {}", p.status);
    }
    Ok(product)
}

pub async fn count_orders_for_product(product_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE product_id = $1").bind(product_id).fetch_one(conn).await
}

pub async fn delete_product(
    product_id: i64,
    allowed: &[ProductStatus],
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let q = format!("DELETE FROM products WHERE id = $1 AND status IN ({})", in_list(allowed));
    let res = sqlx::query(&q).bind(product_id).execute(conn).await?;
    Ok(res.rows_affected() > 0)
}
