//! Database-backed tests skip themselves when DATABASE_URL is unset; the
//! pipeline tests use mock clients and always run.

pub mod analytics_test;
pub mod auth_test;
pub mod common;
pub mod pipeline_test;
pub mod query_test;
pub mod records_test;
