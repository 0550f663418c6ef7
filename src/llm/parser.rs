//! Response parsing for LLM outputs.
//!
//! The SQL prompt asks for a bare query, but models still wrap answers in
//! markdown fences or end them with a semicolon. These are stripped here.

use crate::safety::strip_code_fences;

/// Cleans a generated SQL response.
///
/// Trims, removes a leading ```` ```sql ```` fence, a trailing fence and a
/// trailing semicolon. Returns an empty string when nothing is left.
pub fn clean_sql_response(response: &str) -> String {
    let unfenced = strip_code_fences(response);
    unfenced
        .trim_end()
        .strip_suffix(';')
        .unwrap_or(&unfenced)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_sql_untouched() {
        assert_eq!(
            clean_sql_response("SELECT * FROM products p"),
            "SELECT * FROM products p"
        );
    }

    #[test]
    fn test_fenced_sql() {
        assert_eq!(
            clean_sql_response("```sql\nSELECT p.name FROM products p;\n```"),
            "SELECT p.name FROM products p"
        );
        assert_eq!(
            clean_sql_response("```SQL SELECT 1```"),
            "SELECT 1"
        );
    }

    #[test]
    fn test_trailing_semicolon_with_whitespace() {
        assert_eq!(clean_sql_response("  SELECT 1 ;  \n"), "SELECT 1");
    }

    #[test]
    fn test_only_last_semicolon_removed() {
        assert_eq!(clean_sql_response("SELECT ';' AS s;"), "SELECT ';' AS s");
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(clean_sql_response(""), "");
        assert_eq!(clean_sql_response("```sql\n```"), "");
        assert_eq!(clean_sql_response(" ; "), "");
    }
}
