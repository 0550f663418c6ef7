//! JSON error bodies for the query commands.

use serde::Serialize;

use crate::error::CrmError;

/// `{ error, details?, hint? }` as printed by `--json` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            hint: None,
        }
    }

    /// Body for a failed command, shaped like the `sql` and `ask` error bodies.
    pub fn for_execution(err: &CrmError) -> Self {
        let hint = err.hint().map(str::to_string);
        match err {
            CrmError::Query(_) => Self {
                error: "Failed to execute SQL query".to_string(),
                details: Some(err.message().to_string()),
                hint,
            },
            CrmError::Rejected(_)
            | CrmError::Validation(_)
            | CrmError::Llm(_)
            | CrmError::Auth(_)
            | CrmError::NotFound(_)
            | CrmError::Config(_) => Self {
                error: err.message().to_string(),
                details: None,
                hint,
            },
            _ => Self {
                error: "An unexpected error occurred".to_string(),
                details: Some(err.message().to_string()),
                hint: Some("Check the server logs for more information".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_query_error_body() {
        let body = ErrorBody::for_execution(&CrmError::query("relation \"orders\" does not exist"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "error": "Failed to execute SQL query",
                "details": "relation \"orders\" does not exist",
                "hint": "Check if the query syntax is correct and all tables/columns exist"
            })
        );
    }

    #[test]
    fn test_database_hint_replaces_generic_hint() {
        let body = ErrorBody::for_execution(&CrmError::query(
            "column \"nme\" does not exist\n  HINT: Perhaps you meant to reference the column \"customers.name\".",
        ));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "error": "Failed to execute SQL query",
                "details": "column \"nme\" does not exist",
                "hint": "Perhaps you meant to reference the column \"customers.name\"."
            })
        );
    }

    #[test]
    fn test_rejected_body() {
        let body = ErrorBody::for_execution(&CrmError::rejected("Only read-only queries are allowed"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "error": "Only read-only queries are allowed",
                "hint": "For security reasons, only SELECT, WITH, and other read operations are permitted"
            })
        );
    }

    #[test]
    fn test_validation_body_has_only_error() {
        let body = ErrorBody::for_execution(&CrmError::validation(
            "Question is required and must be a string",
        ));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"error": "Question is required and must be a string"})
        );
    }

    #[test]
    fn test_unexpected_error_body() {
        let body = ErrorBody::for_execution(&CrmError::connection("pool closed"));
        assert_eq!(body.error, "An unexpected error occurred");
        assert_eq!(body.details.as_deref(), Some("pool closed"));
        assert!(body.hint.unwrap().contains("server logs"));
    }
}
