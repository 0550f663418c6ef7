//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient`
//! trait using sqlx, and owns the pool that record management shares.

use crate::config::ConnectionConfig;
use crate::db::{is_row_query, ColumnInfo, DatabaseClient, QueryResult, Row};
use crate::error::{CrmError, Result, DATABASE_HINT_MARKER};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, Statement, TypeInfo};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// PostgreSQL database client.
#[derive(Debug, Clone)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Creates a new PostgresClient from an existing connection pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the configured database, retrying transient failures
    /// with exponential backoff.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&conn_str)
                .await;

            match result {
                Ok(pool) => {
                    debug!("Connected to {}", config.display_string());
                    return Ok(Self { pool });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    last_error = Some(e);

                    if !is_transient || attempt == MAX_RETRY_ATTEMPTS {
                        break;
                    }

                    warn!(
                        "Connection attempt {} failed (transient error), retrying in {:?}",
                        attempt, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }

        Err(match last_error {
            Some(e) => map_connection_error(e, config),
            None => CrmError::connection("No connection attempt was made"),
        })
    }

    /// Returns the underlying pool for record management.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_in_read_only_tx(&self, sql: &str) -> Result<Vec<PgRow>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CrmError::connection(format!("Failed to start transaction: {e}")))?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| CrmError::query(format_query_error(e)))?;
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{QUERY_TIMEOUT_SECS}s'"
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| CrmError::query(format_query_error(e)))?;

        let rows = if is_row_query(sql) {
            let statement = (&mut *tx)
                .prepare(sql)
                .await
                .map_err(|e| CrmError::query(format_query_error(e)))?;
            let names: Vec<String> = statement
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect();
            let aliases = dedupe_column_names(&names);
            if aliases.is_some() {
                debug!("Renaming duplicate result columns in {:?}", names);
            }
            let wrapped = wrap_row_query(sql, aliases.as_deref());
            sqlx::query(&wrapped).fetch_all(&mut *tx).await
        } else {
            sqlx::query(sql).fetch_all(&mut *tx).await
        }
        .map_err(|e| CrmError::query(format_query_error(e)))?;

        // Read-only work: nothing to keep.
        if let Err(e) = tx.rollback().await {
            warn!("Failed to roll back read-only transaction: {e}");
        }

        Ok(rows)
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_read_only(&self, sql: &str) -> Result<QueryResult> {
        let sql = sql.trim().trim_end_matches(';').trim_end();
        let start = Instant::now();

        let pg_rows = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS + 5),
            self.fetch_in_read_only_tx(sql),
        )
        .await
        .map_err(|_| {
            CrmError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })??;

        let execution_time = start.elapsed();

        let result = if is_row_query(sql) {
            let rows = pg_rows
                .iter()
                .map(|r| match r.try_get::<Value, _>(0) {
                    Ok(Value::Object(map)) => Ok(map),
                    Ok(other) => Err(CrmError::internal(format!(
                        "Expected a JSON object row, got {other}"
                    ))),
                    Err(e) => Err(CrmError::query(format!("Failed to decode row: {e}"))),
                })
                .collect::<Result<Vec<Row>>>()?;
            QueryResult::from_rows(rows)
        } else {
            let columns = pg_rows
                .first()
                .map(|r| {
                    r.columns()
                        .iter()
                        .map(|c| ColumnInfo::new(c.name(), c.type_info().name()))
                        .collect()
                })
                .unwrap_or_default();
            let rows = pg_rows.iter().map(convert_row).collect();
            QueryResult {
                columns,
                ..QueryResult::from_rows(rows)
            }
        };

        if result.row_count > MAX_ROWS {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                result.row_count, MAX_ROWS
            );
        }

        Ok(result
            .truncate(MAX_ROWS)
            .with_execution_time(execution_time))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Wraps a SELECT/WITH query so each row comes back as one JSON object.
///
/// The inner query sits on its own lines so a trailing `--` comment cannot
/// swallow the closing parenthesis.
fn wrap_row_query(sql: &str, aliases: Option<&[String]>) -> String {
    let alias_list = aliases
        .map(|names| {
            let quoted: Vec<String> = names
                .iter()
                .map(|n| format!("\"{}\"", n.replace('"', "\"\"")))
                .collect();
            format!("({})", quoted.join(", "))
        })
        .unwrap_or_default();
    format!("SELECT to_json(q) AS row FROM (\n{sql}\n) AS q{alias_list}")
}

/// Returns unique replacement names when a result repeats a column name.
///
/// `to_json` keeps only one value per key, so `SELECT c.id, s.id` would lose
/// a column. Later repeats get a numeric suffix: `id`, `id_2`.
fn dedupe_column_names(names: &[String]) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    if names.iter().all(|n| seen.insert(n.as_str())) {
        return None;
    }

    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut used = HashSet::new();
    let renamed = names
        .iter()
        .map(|name| {
            if used.insert(name.clone()) {
                return name.clone();
            }
            let mut n = 2;
            loop {
                let candidate = format!("{name}_{n}");
                if !taken.contains(&candidate) {
                    taken.insert(candidate.clone());
                    used.insert(candidate.clone());
                    return candidate;
                }
                n += 1;
            }
        })
        .collect();
    Some(renamed)
}

/// Converts a directly decoded row (EXPLAIN, SHOW) into a JSON row.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            (
                col.name().to_string(),
                convert_value(row, i, col.type_info().name()),
            )
        })
        .collect()
}

/// Converts a single column value to JSON based on its PostgreSQL type.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match type_name.to_uppercase().as_str() {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::from(v as f64))
            .unwrap_or(Value::Null),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(index)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
        || error_str.contains("does not exist")
    {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> CrmError {
    let mut resolved = config.clone();
    let _ = resolved.normalize();
    let host = resolved.host.as_deref().unwrap_or("localhost");
    let port = resolved.port;
    let user = resolved.user.as_deref().unwrap_or("unknown");
    let database = resolved.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        CrmError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        CrmError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        CrmError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        CrmError::connection(
            "Server requires SSL. Add '?sslmode=require' to the connection string.",
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        CrmError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        CrmError::connection(error.to_string())
    }
}

/// Formats a query error with the PostgreSQL detail and hint when present.
pub(crate) fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str(DATABASE_HINT_MARKER);
            result.push_str(hint);
        }
    }

    result
}
