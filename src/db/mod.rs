//! Database access for the CRM.
//!
//! `DatabaseClient` is the seam the query pipeline executes through, so it
//! can run against PostgreSQL or an in-memory mock. Record management works
//! on the PostgreSQL pool directly.

mod migrations;
mod mock;
mod postgres;
mod types;

pub use migrations::{run_migrations, CURRENT_VERSION};
pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{display_value, ColumnInfo, QueryResult, Row};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the interface for read-only query execution.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL statement inside a read-only transaction and returns
    /// the rows as JSON objects.
    async fn execute_read_only(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Returns true when the statement can be wrapped as a derived table,
/// i.e. it is a plain `SELECT` or a `WITH` query.
pub(crate) fn is_row_query(sql: &str) -> bool {
    let first = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(first.as_str(), "select" | "with")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_row_query() {
        assert!(is_row_query("SELECT 1"));
        assert!(is_row_query("  with t as (select 1) select * from t"));
        assert!(is_row_query("select\n*\nfrom products"));
        assert!(!is_row_query("EXPLAIN SELECT 1"));
        assert!(!is_row_query("SHOW search_path"));
        assert!(!is_row_query(""));
    }
}
