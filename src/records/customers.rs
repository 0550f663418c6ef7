//! Customer records.
//!
//! CRUD over the `customers` table plus the per-customer sales summary shown
//! in the customer list.

use super::validation::{clearable, clearable_assign, non_blank, require_email, require_min_len};
use crate::error::{CrmError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A customer row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for CustomerStatus {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(CrmError::validation(format!(
                "Invalid status '{s}'. Expected 'active' or 'inactive'"
            ))),
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: CustomerStatus,
}

impl NewCustomer {
    /// Checks the form rules: name of at least 2 characters and a valid email.
    pub fn validate(&self) -> Result<()> {
        require_min_len("Name", &self.name, 2)?;
        require_email(&self.email)
    }
}

/// Partial update of a customer. `None` leaves the field unchanged; a blank
/// `phone` or `company` clears it.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<CustomerStatus>,
}

impl CustomerChanges {
    /// Validates the fields that are present.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_min_len("Name", name, 2)?;
        }
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.status.is_none()
    }
}

/// A customer with lifetime sales figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: Customer,
    pub total_spent: f64,
    pub order_count: i64,
    /// Date of the most recent sale, `YYYY-MM-DD`.
    pub last_order: Option<String>,
}

/// Client-side filter over customer summaries. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
    pub statuses: Vec<CustomerStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub min_orders: Option<i64>,
    pub min_spent: Option<f64>,
}

impl CustomerFilter {
    pub fn matches(&self, summary: &CustomerSummary) -> bool {
        let customer = &summary.customer;

        let matches_search = self.search.as_deref().map_or(true, |term| {
            let term = term.to_lowercase();
            customer.name.to_lowercase().contains(&term)
                || customer.email.to_lowercase().contains(&term)
        });
        let matches_status = self.statuses.is_empty()
            || self
                .statuses
                .iter()
                .any(|s| s.as_str() == customer.status);
        let matches_dates = self.created_from.map_or(true, |from| customer.created_at >= from)
            && self.created_to.map_or(true, |to| customer.created_at <= to);
        let matches_orders = self.min_orders.map_or(true, |n| summary.order_count >= n);
        let matches_spent = self.min_spent.map_or(true, |n| summary.total_spent >= n);

        matches_search && matches_status && matches_dates && matches_orders && matches_spent
    }

    pub fn apply(&self, summaries: Vec<CustomerSummary>) -> Vec<CustomerSummary> {
        summaries.into_iter().filter(|s| self.matches(s)).collect()
    }
}

/// The slice of a sale needed for customer summaries.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CustomerSale {
    pub customer_id: Uuid,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Joins customers with their sales.
pub fn summarize(customers: Vec<Customer>, sales: &[CustomerSale]) -> Vec<CustomerSummary> {
    let mut by_customer: HashMap<Uuid, (f64, i64, Option<DateTime<Utc>>)> = HashMap::new();
    for sale in sales {
        let entry = by_customer.entry(sale.customer_id).or_insert((0.0, 0, None));
        entry.0 += sale.total_amount;
        entry.1 += 1;
        entry.2 = entry.2.max(Some(sale.created_at));
    }

    customers
        .into_iter()
        .map(|customer| {
            let (total_spent, order_count, last) =
                by_customer.get(&customer.id).copied().unwrap_or_default();
            CustomerSummary {
                customer,
                total_spent,
                order_count,
                last_order: last.map(|d| d.format("%Y-%m-%d").to_string()),
            }
        })
        .collect()
}

const CUSTOMER_COLUMNS: &str =
    "id, name, email, phone, company, status, created_at, updated_at";

/// Lists customers, newest first.
pub async fn list_customers(pool: &PgPool) -> Result<Vec<Customer>> {
    sqlx::query_as(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch customers: {e}")))
}

/// Lists customers with their sales summary, newest first.
pub async fn list_customer_summaries(pool: &PgPool) -> Result<Vec<CustomerSummary>> {
    let customers = list_customers(pool).await?;
    let sales: Vec<CustomerSale> = sqlx::query_as(
        "SELECT customer_id, total_amount::float8 AS total_amount, created_at FROM sales",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch customer sales: {e}")))?;

    Ok(summarize(customers, &sales))
}

/// Gets a customer by id.
pub async fn get_customer(pool: &PgPool, id: Uuid) -> Result<Customer> {
    sqlx::query_as(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch customer: {e}")))?
    .ok_or_else(|| CrmError::not_found(format!("Customer {id} not found")))
}

/// Creates a customer after validating it.
pub async fn create_customer(pool: &PgPool, input: NewCustomer) -> Result<Customer> {
    input.validate()?;

    sqlx::query_as(&format!(
        r#"
        INSERT INTO customers (name, email, phone, company, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {CUSTOMER_COLUMNS}
        "#
    ))
    .bind(input.name.trim())
    .bind(input.email.trim())
    .bind(non_blank(input.phone))
    .bind(non_blank(input.company))
    .bind(input.status.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to create customer: {e}")))
}

/// Applies a partial update and bumps `updated_at`.
pub async fn update_customer(pool: &PgPool, id: Uuid, changes: CustomerChanges) -> Result<Customer> {
    changes.validate()?;
    if changes.is_empty() {
        return get_customer(pool, id).await;
    }

    let phone = clearable_assign("phone", "$4");
    let company = clearable_assign("company", "$5");
    sqlx::query_as(&format!(
        r#"
        UPDATE customers SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            {phone},
            {company},
            status = COALESCE($6, status),
            updated_at = now()
        WHERE id = $1
        RETURNING {CUSTOMER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.name.map(|n| n.trim().to_string()))
    .bind(changes.email.map(|e| e.trim().to_string()))
    .bind(clearable(changes.phone))
    .bind(clearable(changes.company))
    .bind(changes.status.map(|s| s.as_str()))
    .fetch_optional(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to update customer: {e}")))?
    .ok_or_else(|| CrmError::not_found(format!("Customer {id} not found")))
}

/// Deletes a customer. Their sales are removed by the foreign key cascade.
pub async fn delete_customer(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| CrmError::query(format!("Failed to delete customer: {e}")))?;

    if result.rows_affected() == 0 {
        return Err(CrmError::not_found(format!("Customer {id} not found")));
    }
    Ok(())
}
