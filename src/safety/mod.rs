//! Read-only query guard.
//!
//! Ad-hoc SQL (typed by a user or generated by the LLM) must pass two checks
//! before it reaches the database: the keyword filter in [`keywords`] and the
//! sqlparser classification in [`parser`]. Either one can reject a query.

pub mod keywords;
mod parser;

pub use keywords::{is_read_only_query, strip_code_fences};
pub use parser::{classify_sql, SqlClassifier};

use crate::error::{CrmError, Result};
use std::fmt;
use tracing::warn;

/// Error text returned for any query that is not read-only.
pub const READ_ONLY_MESSAGE: &str = "Only read-only queries are allowed";

/// Safety level of a SQL statement, ordered from least to most dangerous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyLevel {
    /// Reads only (SELECT, EXPLAIN, SHOW).
    Safe,
    /// Modifies rows (INSERT, UPDATE, MERGE, row locks).
    Mutating,
    /// Deletes data or changes the schema or permissions.
    Destructive,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Grant,
    Revoke,
    Explain,
    Describe,
    Show,
    Merge,
    /// Several statements; holds the most dangerous one.
    Multiple(Box<StatementType>),
    Unknown,
}

impl StatementType {
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Truncate => write!(f, "TRUNCATE"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Grant => write!(f, "GRANT"),
            Self::Revoke => write!(f, "REVOKE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Describe => write!(f, "DESCRIBE"),
            Self::Show => write!(f, "SHOW"),
            Self::Merge => write!(f, "MERGE"),
            Self::Multiple(inner) => write!(f, "Multiple ({inner})"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub level: SafetyLevel,
    pub statement_type: StatementType,
    /// Set when the SQL could not be classified normally.
    pub warning: Option<String>,
}

impl ClassificationResult {
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            warning: None,
        }
    }

    pub fn with_warning(
        level: SafetyLevel,
        statement_type: StatementType,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            level,
            statement_type,
            warning: Some(warning.into()),
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.level == SafetyLevel::Safe
    }
}

/// Gatekeeper for ad-hoc SQL.
#[derive(Debug, Default)]
pub struct ReadOnlyGuard {
    classifier: SqlClassifier,
}

impl ReadOnlyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a query and returns it with code fences removed.
    ///
    /// Fails with [`CrmError::Rejected`] unless the query is a single
    /// statement that both checks consider read-only.
    pub fn check(&self, sql: &str) -> Result<String> {
        let cleaned = strip_code_fences(sql);

        if !is_read_only_query(&cleaned) {
            match keywords::find_disallowed_keyword(&cleaned) {
                Some(keyword) => warn!("Rejected query containing '{keyword}'"),
                None => warn!("Rejected query with a non-read verb"),
            }
            return Err(CrmError::rejected(READ_ONLY_MESSAGE));
        }

        let classification = self.classifier.classify(&cleaned);
        if !classification.is_read_only() {
            warn!(
                "Rejected {} query ({})",
                classification.statement_type, classification.level
            );
            return Err(CrmError::rejected(READ_ONLY_MESSAGE));
        }
        if classification.statement_type.is_multiple() {
            warn!("Rejected input with more than one statement");
            return Err(CrmError::rejected(READ_ONLY_MESSAGE));
        }

        Ok(cleaned)
    }
}
