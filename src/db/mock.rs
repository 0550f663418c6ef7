//! Mock database clients for testing.
//!
//! Return canned rows and remember the SQL they were asked to run.

use super::{DatabaseClient, QueryResult, Row};
use crate::error::{CrmError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns predefined rows for any query.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    rows: Vec<Row>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock that answers every query with one `result` row.
    pub fn new() -> Self {
        let mut row = Row::new();
        row.insert("result".to_string(), serde_json::Value::from(1));
        Self::with_rows(vec![row])
    }

    /// Creates a mock that answers every query with the given rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Returns the SQL statements executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_read_only(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }

        Ok(QueryResult::from_rows(self.rows.clone()).with_execution_time(Duration::from_millis(1)))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock database client whose queries always fail with the given message.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails every query.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_read_only(&self, _sql: &str) -> Result<QueryResult> {
        Err(CrmError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
