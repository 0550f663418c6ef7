//! Keyword filter for read-only SQL.
//!
//! A query passes when its first word is a read verb and no data or schema
//! modifying keyword appears anywhere in it as a whole word.

use regex::Regex;
use std::sync::OnceLock;

/// Verbs a read-only query may start with.
pub const ALLOWED_START_KEYWORDS: &[&str] =
    &["select", "with", "explain", "show", "describe", "desc"];

/// Keywords that disqualify a query wherever they appear.
pub const DISALLOWED_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "truncate", "alter", "create", "replace", "grant",
    "revoke",
];

fn disallowed_regex() -> &'static Regex {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    DISALLOWED.get_or_init(|| {
        let pattern = format!(r"\b({})\b", DISALLOWED_KEYWORDS.join("|"));
        Regex::new(&pattern).expect("keyword pattern is valid")
    })
}

fn opening_fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?i)^```sql\s*").expect("fence pattern is valid"))
}

/// Removes a leading ```` ```sql ```` fence and a trailing ```` ``` ```` fence.
pub fn strip_code_fences(sql: &str) -> String {
    let trimmed = sql.trim();
    let without_open = opening_fence_regex().replace(trimmed, "");
    let without_close = without_open.trim_end().trim_end_matches("```");
    without_close.trim().to_string()
}

/// Lowercases and collapses runs of whitespace into single spaces.
pub fn normalize(sql: &str) -> String {
    sql.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first disallowed keyword found in the query, if any.
pub fn find_disallowed_keyword(sql: &str) -> Option<String> {
    disallowed_regex()
        .find(&normalize(sql))
        .map(|m| m.as_str().to_string())
}

/// Returns true if the query starts with an allowed verb.
pub fn starts_with_allowed_keyword(sql: &str) -> bool {
    let normalized = normalize(&strip_code_fences(sql));
    let first_word = normalized.split(' ').next().unwrap_or_default();
    ALLOWED_START_KEYWORDS.contains(&first_word)
}

/// Returns true if the query passes the keyword filter.
pub fn is_read_only_query(sql: &str) -> bool {
    let cleaned = strip_code_fences(sql);
    starts_with_allowed_keyword(&cleaned) && find_disallowed_keyword(&cleaned).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```sql\nSELECT * FROM products\n```"),
            "SELECT * FROM products"
        );
        assert_eq!(strip_code_fences("```SQL SELECT 1```"), "SELECT 1");
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  SELECT\n\t*   FROM  Sales "), "select * from sales");
    }

    #[test]
    fn test_read_queries_pass() {
        assert!(is_read_only_query("SELECT name, price FROM products"));
        assert!(is_read_only_query(
            "WITH monthly AS (SELECT 1) SELECT * FROM monthly"
        ));
        assert!(is_read_only_query("explain select * from sales"));
        assert!(is_read_only_query("SHOW search_path"));
        assert!(is_read_only_query("```sql\nSELECT * FROM sales\n```"));
    }

    #[test]
    fn test_column_names_containing_keywords_pass() {
        assert!(is_read_only_query(
            "SELECT created_at, updated_at FROM products"
        ));
        assert!(is_read_only_query("SELECT * FROM sales WHERE status = 'deleted'"));
    }

    #[test]
    fn test_modifying_queries_fail() {
        assert!(!is_read_only_query("DELETE FROM sales"));
        assert!(!is_read_only_query("UPDATE products SET price = 0"));
        assert!(!is_read_only_query("INSERT INTO sales VALUES (1)"));
        assert!(!is_read_only_query("drop table customers"));
    }

    #[test]
    fn test_hidden_modification_fails() {
        assert!(!is_read_only_query(
            "WITH gone AS (DELETE FROM sales RETURNING *) SELECT * FROM gone"
        ));
        assert!(!is_read_only_query("SELECT 1; DROP TABLE customers"));
        assert_eq!(
            find_disallowed_keyword("SELECT 1;\nTRUNCATE sales"),
            Some("truncate".to_string())
        );
    }

    #[test]
    fn test_keyword_in_literal_is_rejected() {
        assert!(!is_read_only_query(
            "SELECT replace(name, 'a', 'b') FROM products"
        ));
    }

    #[test]
    fn test_first_word_must_be_separated() {
        assert!(!is_read_only_query("select*from products"));
        assert!(!is_read_only_query(""));
        assert!(!is_read_only_query("VACUUM"));
    }
}
