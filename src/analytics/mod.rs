//! Sales and customer analytics.
//!
//! `aggregate` holds the arithmetic; `fetch` reads the rows it needs.

pub mod aggregate;
pub mod fetch;

pub use aggregate::{
    category_distribution, customer_stats, dashboard_stats, monthly_category_breakdown,
    percent_change, sales_analytics, sales_by_category, sales_by_date, CategoryBreakdown,
    CategoryMonth, CategoryPerformance, CustomerCounts, CustomerStats, DashboardStats, DateRange,
    MonthlySales, SaleFact, SalesAnalytics, DEFAULT_CATEGORIES, UNCATEGORIZED,
};
pub use fetch::{
    fetch_customer_counts, fetch_order_totals, fetch_sale_facts, load_customer_stats,
    load_dashboard, load_sales_analytics, Dashboard,
};
