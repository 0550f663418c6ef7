//! Product catalog records.
//!
//! Paginated listing with name search and a category filter, plus CRUD.

use super::validation::{clearable, clearable_assign, non_blank, require_amount, require_min_len};
use crate::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

/// Products shown per catalog page.
pub const ITEMS_PER_PAGE: i64 = 20;

/// Category filter value meaning "no filter".
pub const ALL_CATEGORIES: &str = "all";

/// A product row. `price` is read as a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub photo_url: Option<String>,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a product. Stock starts at zero.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub photo_url: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<()> {
        require_min_len("Name", &self.name, 2)?;
        require_min_len("Category", &self.category, 1)?;
        require_amount("Price", self.price)?;
        require_min_len("Description", &self.description, 10)
    }
}

/// Partial update of a product. A blank `photo_url` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub stock_quantity: Option<i32>,
}

impl ProductChanges {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_min_len("Name", name, 2)?;
        }
        if let Some(category) = &self.category {
            require_min_len("Category", category, 1)?;
        }
        if let Some(price) = self.price {
            require_amount("Price", price)?;
        }
        if let Some(description) = &self.description {
            require_min_len("Description", description, 10)?;
        }
        if matches!(self.stock_quantity, Some(q) if q < 0) {
            return Err(CrmError::validation("Stock quantity cannot be negative"));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.photo_url.is_none()
            && self.stock_quantity.is_none()
    }
}

/// Catalog query: free-text name search, category and 1-based page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: i64,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            page: 1,
        }
    }
}

impl ProductFilter {
    /// The search term, if it is not blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The category to filter on. `"all"` and blank mean no filter.
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
    }

    /// Row offset of the requested page. Pages below 1 are treated as 1.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * ITEMS_PER_PAGE
    }

    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut first = true;
        let mut keyword = |b: &mut QueryBuilder<'_, Postgres>| {
            b.push(if first { " WHERE " } else { " AND " });
            first = false;
        };

        if let Some(term) = self.search_term() {
            keyword(builder);
            builder.push("name ILIKE ").push_bind(format!("%{term}%"));
        }
        if let Some(category) = self.category_filter() {
            keyword(builder);
            builder.push("category = ").push_bind(category.to_string());
        }
    }
}

/// One catalog page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Number of pages needed for `total` rows.
pub fn total_pages(total: i64) -> i64 {
    (total + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE
}

const PRODUCT_COLUMNS: &str = "id, name, description, price::float8 AS price, category, \
     photo_url, stock_quantity, created_at, updated_at";

/// Lists one page of products, newest first, with the exact match count.
pub async fn list_products(pool: &PgPool, filter: &ProductFilter) -> Result<ProductPage> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    filter.push_conditions(&mut count);
    let total: i64 = count
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to count products: {e}")))?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
    filter.push_conditions(&mut select);
    select
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(ITEMS_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(filter.offset());

    let products = select
        .build_query_as::<Product>()
        .fetch_all(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to fetch products: {e}")))?;

    Ok(ProductPage {
        products,
        total,
        page: filter.page.max(1),
        per_page: ITEMS_PER_PAGE,
        total_pages: total_pages(total),
    })
}

/// Distinct non-null categories, alphabetically.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT DISTINCT category FROM products WHERE category IS NOT NULL ORDER BY category",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch categories: {e}")))
}

/// Gets a product by id.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Product> {
    sqlx::query_as(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch product: {e}")))?
    .ok_or_else(|| CrmError::not_found(format!("Product {id} not found")))
}

/// Creates a product with zero stock.
pub async fn create_product(pool: &PgPool, input: NewProduct) -> Result<Product> {
    input.validate()?;

    sqlx::query_as(&format!(
        r#"
        INSERT INTO products (name, category, price, description, photo_url, stock_quantity)
        VALUES ($1, $2, $3::float8::numeric, $4, $5, 0)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(input.category.trim())
    .bind(input.price)
    .bind(input.description.trim())
    .bind(non_blank(input.photo_url))
    .fetch_one(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to create product: {e}")))
}

/// Applies a partial update and bumps `updated_at`.
pub async fn update_product(pool: &PgPool, id: Uuid, changes: ProductChanges) -> Result<Product> {
    changes.validate()?;
    if changes.is_empty() {
        return get_product(pool, id).await;
    }

    let photo_url = clearable_assign("photo_url", "$6");
    sqlx::query_as(&format!(
        r#"
        UPDATE products SET
            name = COALESCE($2, name),
            category = COALESCE($3, category),
            price = COALESCE($4::float8::numeric, price),
            description = COALESCE($5, description),
            {photo_url},
            stock_quantity = COALESCE($7, stock_quantity),
            updated_at = now()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.map(|n| n.trim().to_string()))
    .bind(changes.category.map(|c| c.trim().to_string()))
    .bind(changes.price)
    .bind(changes.description.map(|d| d.trim().to_string()))
    .bind(clearable(changes.photo_url))
    .bind(changes.stock_quantity)
    .fetch_optional(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to update product: {e}")))?
    .ok_or_else(|| CrmError::not_found(format!("Product {id} not found")))
}

/// Deletes a product and, by cascade, its sales.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to delete product: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(CrmError::not_found(format!("Product {id} not found")));
    }
    Ok(())
}
