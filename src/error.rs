//! Error types for crm-insight.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Separates a PostgreSQL hint from the rest of a query error message.
pub(crate) const DATABASE_HINT_MARKER: &str = "\n  HINT: ";

/// Main error type for CRM operations.
#[derive(Error, Debug)]
pub enum CrmError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input that failed a record or request validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials and sessions.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A record that was addressed by id does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// SQL refused by the read-only filter.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Local storage errors (session file, keyring, migrations).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an authentication error with the given message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Creates a not-found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Creates a read-only rejection with the given message.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Creates a persistence error with the given message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Validation(_) => "Validation Error",
            Self::Auth(_) => "Authentication Error",
            Self::NotFound(_) => "Not Found",
            Self::Rejected(_) => "Rejected Query",
            Self::Persistence(_) => "Persistence Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the inner message without the category prefix or a
    /// database hint.
    pub fn message(&self) -> &str {
        let message = match self {
            Self::Connection(m)
            | Self::Query(m)
            | Self::Llm(m)
            | Self::Config(m)
            | Self::Validation(m)
            | Self::Auth(m)
            | Self::NotFound(m)
            | Self::Rejected(m)
            | Self::Persistence(m)
            | Self::Internal(m) => m,
        };
        match message.split_once(DATABASE_HINT_MARKER) {
            Some((before, _)) => before,
            None => message,
        }
    }

    /// Returns a follow-up hint for errors raised by the query pipeline.
    ///
    /// A hint reported by PostgreSQL wins over the generic query hint.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Rejected(_) => Some(
                "For security reasons, only SELECT, WITH, and other read operations are permitted",
            ),
            Self::Query(m) => Some(
                m.split_once(DATABASE_HINT_MARKER)
                    .map(|(_, hint)| hint)
                    .unwrap_or("Check if the query syntax is correct and all tables/columns exist"),
            ),
            Self::Connection(_) => Some("Check the server logs for more information"),
            _ => None,
        }
    }

    /// Returns true for errors caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Auth(_) | Self::NotFound(_) | Self::Rejected(_)
        )
    }

    /// Process exit status for a failed command.
    pub fn exit_code(&self) -> i32 {
        if self.is_client_error() {
            2
        } else {
            1
        }
    }

    /// The stderr report: `{category}: {message}` and a `Hint:` line when
    /// there is one.
    pub fn report(&self) -> String {
        let mut report = format!("{}: {}", self.category(), self.message());
        if let Some(hint) = self.hint() {
            report.push_str("\nHint: ");
            report.push_str(hint);
        }
        report
    }
}

/// Result type alias using CrmError.
pub type Result<T> = std::result::Result<T, CrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_connection() {
        let err = CrmError::connection("Cannot connect to localhost:5432");
        assert_eq!(
            err.to_string(),
            "Connection error: Cannot connect to localhost:5432"
        );
        assert_eq!(err.category(), "Connection Error");
    }

    #[test]
    fn test_error_display_query() {
        let err = CrmError::query("column \"emal\" does not exist");
        assert_eq!(err.to_string(), "Query error: column \"emal\" does not exist");
        assert_eq!(err.category(), "Query Error");
        assert!(err.hint().unwrap().contains("tables/columns exist"));
    }

    #[test]
    fn test_error_display_validation() {
        let err = CrmError::validation("Name must be at least 2 characters");
        assert_eq!(
            err.to_string(),
            "Validation error: Name must be at least 2 characters"
        );
        assert!(err.is_client_error());
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_rejected_has_read_only_hint() {
        let err = CrmError::rejected("Only read-only queries are allowed");
        assert_eq!(err.category(), "Rejected Query");
        assert_eq!(err.message(), "Only read-only queries are allowed");
        assert!(err.hint().unwrap().starts_with("For security reasons"));
    }

    #[test]
    fn test_llm_is_not_client_error() {
        let err = CrmError::llm("Rate limited. Please wait.");
        assert_eq!(err.to_string(), "LLM error: Rate limited. Please wait.");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_database_hint_is_split_out() {
        let err = CrmError::query(
            "column \"nme\" does not exist\n  HINT: Perhaps you meant to reference the column \"customers.name\".",
        );
        assert_eq!(err.message(), "column \"nme\" does not exist");
        assert_eq!(
            err.hint(),
            Some("Perhaps you meant to reference the column \"customers.name\".")
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CrmError::not_found("Customer not found").exit_code(), 2);
        assert_eq!(CrmError::rejected("Only read-only queries are allowed").exit_code(), 2);
        assert_eq!(CrmError::connection("pool closed").exit_code(), 1);
    }

    #[test]
    fn test_report_prints_each_part_once() {
        let err = CrmError::query("relation \"orders\" does not exist");
        assert_eq!(
            err.report(),
            "Query Error: relation \"orders\" does not exist\n\
             Hint: Check if the query syntax is correct and all tables/columns exist"
        );
        assert_eq!(
            CrmError::auth("Not signed in").report(),
            "Authentication Error: Not signed in"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CrmError>();
    }
}
