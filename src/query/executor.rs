//! Ad-hoc SQL execution behind the read-only guard.

use serde::Serialize;
use tracing::{info, warn};

use crate::db::{DatabaseClient, QueryResult, Row};
use crate::error::{CrmError, Result};
use crate::safety::ReadOnlyGuard;

/// Successful execution body: `{ results, metadata: { rowCount, query } }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteResponse {
    pub results: Vec<Row>,
    pub metadata: ExecuteMetadata,
    /// Full result with column info and timing, for table output.
    #[serde(skip)]
    pub result: QueryResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteMetadata {
    pub row_count: usize,
    pub query: String,
}

/// Runs user or LLM supplied SQL that must be read-only.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    guard: ReadOnlyGuard,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self {
            db,
            guard: ReadOnlyGuard::new(),
        }
    }

    /// Validates, guards and executes `sql`.
    ///
    /// Blank input is a validation error, non-read-only SQL is rejected
    /// before reaching the database, and database failures surface as
    /// [`CrmError::Query`].
    pub async fn execute(&self, sql: &str) -> Result<ExecuteResponse> {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Err(CrmError::validation(
                "SQL query is required and must be a string",
            ));
        }

        let query = self.guard.check(trimmed)?;
        info!("Executing read-only query: {}", query);

        let result = self.db.execute_read_only(&query).await.map_err(|e| {
            warn!("Error executing SQL query: {e}");
            e
        })?;

        if let Some(warning) = result.truncation_warning() {
            warn!("{warning}");
        }

        Ok(ExecuteResponse {
            results: result.rows.clone(),
            metadata: ExecuteMetadata {
                row_count: result.rows.len(),
                query,
            },
            result,
        })
    }
}
