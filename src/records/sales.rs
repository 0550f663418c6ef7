//! Sale records.

use crate::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

/// Number of sales shown in the "recent sales" panel.
pub const RECENT_SALES_LIMIT: i64 = 5;

/// A sale row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub total_amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for recording a sale. A missing total is priced from the product.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub total_amount: Option<f64>,
    pub status: Option<String>,
}

impl NewSale {
    pub fn validate(&self) -> Result<()> {
        if self.quantity <= 0 {
            return Err(CrmError::validation("Quantity must be greater than zero"));
        }
        if let Some(total) = self.total_amount {
            super::validation::require_amount("Total amount", total)?;
        }
        Ok(())
    }
}

/// Total for `quantity` units at `unit_price`, rounded to cents.
pub fn line_total(unit_price: f64, quantity: i32) -> f64 {
    (unit_price * f64::from(quantity) * 100.0).round() / 100.0
}

/// A sale joined with its customer and product, for the recent sales panel.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RecentSale {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    #[sqlx(skip)]
    pub initials: String,
    pub product_name: String,
    pub product_category: Option<String>,
    pub quantity: i32,
    pub total_amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Uppercased first letter of each word: "jane van doe" -> "JVD".
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Records a sale, pricing it from the product when no total is given.
pub async fn create_sale(pool: &PgPool, input: NewSale) -> Result<Sale> {
    input.validate()?;

    let total = match input.total_amount {
        Some(total) => total,
        None => {
            let price: f64 =
                sqlx::query_scalar("SELECT price::float8 FROM products WHERE id = $1")
                    .bind(input.product_id)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| CrmError::query(format!("Failed to fetch product price: {e}")))?
                    .ok_or_else(|| {
                        CrmError::not_found(format!("Product {} not found", input.product_id))
                    })?;
            line_total(price, input.quantity)
        }
    };

    let status = input
        .status
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "completed".to_string());

    sqlx::query_as(
        r#"
        INSERT INTO sales (customer_id, product_id, quantity, total_amount, status)
        VALUES ($1, $2, $3, $4::float8::numeric, $5)
        RETURNING id, customer_id, product_id, quantity,
                  total_amount::float8 AS total_amount, status, created_at
        "#,
    )
    .bind(input.customer_id)
    .bind(input.product_id)
    .bind(input.quantity)
    .bind(total)
    .bind(status)
    .fetch_one(pool)
    .await
    .map_err(|e| match e.as_database_error().and_then(|d| d.code()) {
        // foreign_key_violation
        Some(code) if code == "23503" => {
            CrmError::not_found("Customer or product does not exist")
        }
        _ => CrmError::query(format!("Failed to record sale: {e}")),
    })
}

/// The most recent sales with customer and product details.
pub async fn recent_sales(pool: &PgPool, limit: i64) -> Result<Vec<RecentSale>> {
    let mut sales: Vec<RecentSale> = sqlx::query_as(
        r#"
        SELECT s.id,
               c.name AS customer_name,
               c.email AS customer_email,
               p.name AS product_name,
               p.category AS product_category,
               s.quantity,
               s.total_amount::float8 AS total_amount,
               s.status,
               s.created_at
        FROM sales s
        JOIN customers c ON c.id = s.customer_id
        JOIN products p ON p.id = s.product_id
        ORDER BY s.created_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch recent sales: {e}")))?;

    for sale in &mut sales {
        sale.initials = initials(&sale.customer_name);
    }
    Ok(sales)
}
