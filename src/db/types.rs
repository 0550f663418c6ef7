//! Query result types.
//!
//! Rows are JSON objects keyed by column name, the same shape the hosted
//! `exec_sql` RPC returns, so results can be printed as tables or passed
//! through unchanged as JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// A row of data: column name to JSON value, in select-list order.
pub type Row = Map<String, Value>;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    ///
    /// Keys are unique: when a query repeats an output column name, later
    /// occurrences are renamed with a numeric suffix (`id`, `id_2`).
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    #[serde(with = "duration_millis")]
    pub execution_time: Duration,

    /// Number of rows in the result (may be truncated).
    pub row_count: usize,

    /// Total number of rows before truncation.
    pub total_rows: usize,

    /// Whether the result was truncated due to exceeding the row cap.
    #[serde(default)]
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a query result from rows, deriving columns from the first row.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = columns_of(&rows);
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
            total_rows: row_count,
            was_truncated: false,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Keeps at most `max_rows` rows, recording the original size.
    pub fn truncate(mut self, max_rows: usize) -> Self {
        self.total_rows = self.rows.len();
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.was_truncated = true;
        }
        self.row_count = self.rows.len();
        self
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns a truncation warning message if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        self.was_truncated.then(|| {
            format!(
                "Result truncated: showing {} of {} rows",
                self.row_count, self.total_rows
            )
        })
    }

    /// Renders every row as display strings, in column order.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .map(|col| row.get(&col.name).map(display_value).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// JSON kind of the column's first non-null value, or the database
    /// type name for directly decoded rows.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Derives column metadata from the keys of the first row.
fn columns_of(rows: &[Row]) -> Vec<ColumnInfo> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    first
        .keys()
        .map(|name| {
            let kind = rows
                .iter()
                .filter_map(|r| r.get(name))
                .find(|v| !v.is_null())
                .map(json_kind)
                .unwrap_or("null");
            ColumnInfo::new(name.clone(), kind)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Formats a JSON value for table display.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_rows_derives_columns_in_order() {
        let result = QueryResult::from_rows(vec![
            row(json!({"name": "Laptop", "total": null, "qty": 3})),
            row(json!({"name": "Desk", "total": 99.5, "qty": 1})),
        ]);

        let names: Vec<_> = result.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "total", "qty"]);
        assert_eq!(result.columns[0].data_type, "string");
        assert_eq!(result.columns[1].data_type, "number");
        assert_eq!(result.row_count, 2);
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult::from_rows(Vec::new());
        assert!(result.is_empty());
        assert!(result.columns.is_empty());
        assert!(result.truncation_warning().is_none());
    }

    #[test]
    fn test_truncate() {
        let rows = (0..5).map(|i| row(json!({ "n": i }))).collect();
        let result = QueryResult::from_rows(rows).truncate(3);

        assert_eq!(result.row_count, 3);
        assert_eq!(result.total_rows, 5);
        assert!(result.was_truncated);
        assert_eq!(
            result.truncation_warning().unwrap(),
            "Result truncated: showing 3 of 5 rows"
        );
    }

    #[test]
    fn test_display_rows() {
        let result = QueryResult::from_rows(vec![row(json!({"a": "x", "b": null, "c": true}))]);
        assert_eq!(result.display_rows(), vec![vec!["x", "NULL", "true"]]);
    }
}
