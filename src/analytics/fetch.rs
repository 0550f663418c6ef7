//! Loads sale facts from Postgres and assembles the dashboard payloads.

use super::aggregate::{
    category_distribution, customer_stats, dashboard_stats, monthly_category_breakdown,
    sales_analytics, sales_by_date, CategoryBreakdown, CustomerCounts, CustomerStats,
    DashboardStats, DateRange, SaleFact, SalesAnalytics, PERIOD_DAYS,
};
use crate::error::{CrmError, Result};
use crate::records::{recent_sales, RecentSale, RECENT_SALES_LIMIT};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::postgres::PgPool;
use std::collections::BTreeMap;
use tracing::debug;

/// Months shown in the category bar chart.
pub const CATEGORY_CHART_MONTHS: u32 = 3;

/// Sales with their product category, optionally only those since `since`.
pub async fn fetch_sale_facts(
    pool: &PgPool,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<SaleFact>> {
    let facts = sqlx::query_as::<_, SaleFact>(
        r#"
        SELECT s.created_at, s.total_amount::float8 AS total_amount, p.category
        FROM sales s
        LEFT JOIN products p ON p.id = s.product_id
        WHERE $1::timestamptz IS NULL OR s.created_at >= $1
        ORDER BY s.created_at
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch sales data: {e}")))?;

    debug!(count = facts.len(), "Fetched sale facts");
    Ok(facts)
}

pub async fn fetch_customer_counts(pool: &PgPool) -> Result<CustomerCounts> {
    sqlx::query_as::<_, CustomerCounts>(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE status = 'active') AS active
        FROM customers
        "#,
    )
    .fetch_one(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch customer counts: {e}")))
}

/// Sale totals since `since`, for the average order value.
pub async fn fetch_order_totals(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<f64>> {
    sqlx::query_scalar::<_, f64>(
        "SELECT total_amount::float8 FROM sales WHERE created_at >= $1",
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .map_err(|e| CrmError::query(format!("Failed to fetch order totals: {e}")))
}

/// Everything the overview page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub daily_sales: BTreeMap<String, f64>,
    pub category_sales: CategoryBreakdown,
    pub category_distribution: BTreeMap<String, f64>,
    pub recent_sales: Vec<RecentSale>,
}

pub async fn load_dashboard(pool: &PgPool, now: DateTime<Utc>) -> Result<Dashboard> {
    let (sales, counts, recent) = tokio::try_join!(
        fetch_sale_facts(pool, None),
        fetch_customer_counts(pool),
        recent_sales(pool, RECENT_SALES_LIMIT),
    )?;

    Ok(Dashboard {
        stats: dashboard_stats(&sales, counts, now),
        daily_sales: sales_by_date(&sales, DateRange::last_days(now, PERIOD_DAYS)),
        category_sales: monthly_category_breakdown(&sales, now, CATEGORY_CHART_MONTHS),
        category_distribution: category_distribution(&sales),
        recent_sales: recent,
    })
}

pub async fn load_sales_analytics(pool: &PgPool, now: DateTime<Utc>) -> Result<SalesAnalytics> {
    let since = now - Duration::days(super::aggregate::ANALYTICS_MONTHS * PERIOD_DAYS);
    let sales = fetch_sale_facts(pool, Some(since)).await?;
    Ok(sales_analytics(&sales, now))
}

pub async fn load_customer_stats(pool: &PgPool, now: DateTime<Utc>) -> Result<CustomerStats> {
    let since = now - Duration::days(PERIOD_DAYS);
    let (counts, totals) = tokio::try_join!(
        fetch_customer_counts(pool),
        fetch_order_totals(pool, since),
    )?;
    Ok(customer_stats(counts, &totals))
}
