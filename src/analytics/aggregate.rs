//! Pure aggregation over sale facts.
//!
//! Every function takes already fetched rows and an explicit `now`, so the
//! numbers behind the dashboard can be checked without a database.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Categories that always appear in per-category totals, even at zero.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Electronics", "Fashion", "Home & Living", "Sports"];

/// Label for sales whose product has no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Length of one reporting period.
pub const PERIOD_DAYS: i64 = 30;

/// A sale reduced to what the analytics need.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SaleFact {
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub category: Option<String>,
}

impl SaleFact {
    fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED)
    }
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days ending at `now`.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self::new(now - Duration::days(days), now)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Customer head counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct CustomerCounts {
    pub total: i64,
    pub active: i64,
}

/// Change from `previous` to `current` in percent; `None` when there is no
/// previous value to compare against.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

/// Revenue per UTC day (`YYYY-MM-DD`) within the range.
pub fn sales_by_date(sales: &[SaleFact], range: DateRange) -> BTreeMap<String, f64> {
    let mut by_date = BTreeMap::new();
    for sale in sales.iter().filter(|s| range.contains(s.created_at)) {
        *by_date
            .entry(sale.created_at.format("%Y-%m-%d").to_string())
            .or_insert(0.0) += sale.total_amount;
    }
    by_date
}

/// Revenue per category within the range, with the default categories
/// always present.
pub fn sales_by_category(sales: &[SaleFact], range: DateRange) -> BTreeMap<String, f64> {
    let mut by_category: BTreeMap<String, f64> = DEFAULT_CATEGORIES
        .iter()
        .map(|c| (c.to_string(), 0.0))
        .collect();
    for sale in sales.iter().filter(|s| range.contains(s.created_at)) {
        *by_category
            .entry(sale.category_label().to_string())
            .or_insert(0.0) += sale.total_amount;
    }
    by_category
}

/// Share of all-time revenue per lower-cased category, in percent.
/// Empty when there is no revenue.
pub fn category_distribution(sales: &[SaleFact]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for sale in sales {
        *totals
            .entry(sale.category_label().to_lowercase())
            .or_insert(0.0) += sale.total_amount;
    }

    let total: f64 = totals.values().sum();
    if total == 0.0 {
        return BTreeMap::new();
    }

    totals
        .into_iter()
        .map(|(category, amount)| (category, amount / total * 100.0))
        .collect()
}

/// Headline numbers for the overview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Revenue of the last 30 days.
    pub total_revenue: f64,
    /// Revenue of the 30 days before that.
    pub previous_revenue: f64,
    pub revenue_change: Option<f64>,
    pub total_customers: i64,
    pub active_customers: i64,
}

pub fn dashboard_stats(
    sales: &[SaleFact],
    customers: CustomerCounts,
    now: DateTime<Utc>,
) -> DashboardStats {
    let current = DateRange::last_days(now, PERIOD_DAYS);
    let previous = DateRange::last_days(current.start, PERIOD_DAYS);

    let total_revenue: f64 = sales_by_date(sales, current).values().sum();
    let previous_revenue: f64 = sales_by_date(sales, previous).values().sum();

    DashboardStats {
        total_revenue,
        previous_revenue,
        revenue_change: percent_change(total_revenue, previous_revenue),
        total_customers: customers.total,
        active_customers: customers.active,
    }
}

/// Category revenue for one calendar month, labelled like `Mar 2025`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMonth {
    pub date: String,
    pub categories: BTreeMap<String, f64>,
}

/// Per-category revenue for recent months plus totals of the default categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub months: Vec<CategoryMonth>,
    pub totals: BTreeMap<String, f64>,
}

fn start_of_month(at: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(at.year(), at.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(at)
}

/// Category revenue of the last `months` months, oldest first.
///
/// Month `i` runs from the first of the month to the same point in time
/// `i` months before `now`, so the current month is month-to-date.
pub fn monthly_category_breakdown(
    sales: &[SaleFact],
    now: DateTime<Utc>,
    months: u32,
) -> CategoryBreakdown {
    let mut breakdown: Vec<CategoryMonth> = (0..months)
        .filter_map(|i| now.checked_sub_months(Months::new(i)))
        .map(|month_end| CategoryMonth {
            date: month_end.format("%b %Y").to_string(),
            categories: sales_by_category(
                sales,
                DateRange::new(start_of_month(month_end), month_end),
            ),
        })
        .collect();
    breakdown.reverse();

    let totals = DEFAULT_CATEGORIES
        .iter()
        .map(|category| {
            let total = breakdown
                .iter()
                .filter_map(|m| m.categories.get(*category))
                .sum();
            (category.to_string(), total)
        })
        .collect();

    CategoryBreakdown {
        months: breakdown,
        totals,
    }
}

/// Revenue of one month with a naive forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    /// Short month name, e.g. `Jan`.
    pub name: String,
    pub sales: f64,
    /// `round(sales * 1.1)`.
    pub prediction: f64,
}

/// Revenue of one category in the current and previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub name: String,
    pub current: f64,
    pub previous: f64,
}

/// Input for the AI sales page and the insight generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalytics {
    pub monthly_data: Vec<MonthlySales>,
    pub category_data: Vec<CategoryPerformance>,
}

/// Months covered by [`sales_analytics`].
pub const ANALYTICS_MONTHS: i64 = 7;

/// Months counted as "current" in category performance.
pub const CURRENT_MONTHS: i64 = 3;

/// Monthly revenue over the last seven 30-day months, chronologically, and
/// per-category revenue split into the last three months and the rest.
pub fn sales_analytics(sales: &[SaleFact], now: DateTime<Utc>) -> SalesAnalytics {
    let window_start = now - Duration::days(ANALYTICS_MONTHS * PERIOD_DAYS);
    let current_start = now - Duration::days(CURRENT_MONTHS * PERIOD_DAYS);
    let in_window = || sales.iter().filter(move |s| s.created_at >= window_start);

    let mut months: BTreeMap<(i32, u32), (String, f64)> = BTreeMap::new();
    for sale in in_window() {
        let key = (sale.created_at.year(), sale.created_at.month());
        let entry = months
            .entry(key)
            .or_insert_with(|| (sale.created_at.format("%b").to_string(), 0.0));
        entry.1 += sale.total_amount;
    }

    let mut categories: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for sale in in_window() {
        let entry = categories
            .entry(sale.category_label().to_string())
            .or_insert((0.0, 0.0));
        if sale.created_at >= current_start {
            entry.0 += sale.total_amount;
        } else {
            entry.1 += sale.total_amount;
        }
    }

    SalesAnalytics {
        monthly_data: months
            .into_values()
            .map(|(name, sales)| MonthlySales {
                name,
                sales,
                prediction: (sales * 1.1).round(),
            })
            .collect(),
        category_data: categories
            .into_iter()
            .map(|(name, (current, previous))| CategoryPerformance {
                name,
                current,
                previous,
            })
            .collect(),
    }
}

/// Figures for the customers page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStats {
    pub total_customers: i64,
    pub active_customers: i64,
    /// Mean sale total over the last 30 days.
    pub average_order_value: f64,
    /// Active customers as a percentage of all customers.
    pub customer_retention: f64,
}

pub fn customer_stats(customers: CustomerCounts, recent_order_totals: &[f64]) -> CustomerStats {
    let average_order_value = if recent_order_totals.is_empty() {
        0.0
    } else {
        recent_order_totals.iter().sum::<f64>() / recent_order_totals.len() as f64
    };
    let customer_retention = if customers.total > 0 {
        customers.active as f64 / customers.total as f64 * 100.0
    } else {
        0.0
    };

    CustomerStats {
        total_customers: customers.total,
        active_customers: customers.active,
        average_order_value,
        customer_retention,
    }
}
