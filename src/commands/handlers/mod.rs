//! Command handler implementations, one module per command group.

pub mod analytics;
pub mod auth;
pub mod customers;
pub mod products;
pub mod queries;
pub mod sales;

use chrono::{DateTime, Utc};

/// Cell text for an optional value.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

pub(crate) fn short_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
