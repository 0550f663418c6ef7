//! Field validation shared by record and account forms.

use crate::error::{CrmError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Returns true if the value looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value.trim())
}

/// Requires a syntactically valid email.
pub fn require_email(value: &str) -> Result<()> {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(CrmError::validation("Invalid email address"))
    }
}

/// Requires at least `min` characters after trimming.
pub fn require_min_len(label: &str, value: &str, min: usize) -> Result<()> {
    if value.trim().chars().count() >= min {
        Ok(())
    } else {
        Err(CrmError::validation(format!(
            "{label} must be at least {min} characters"
        )))
    }
}

/// Requires a finite, non-negative amount.
pub fn require_amount(label: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CrmError::validation(format!(
            "{label} must be a non-negative number"
        )))
    }
}

/// Trims a change to a nullable text column. `None` keeps the stored value
/// and a blank value clears it.
pub fn clearable(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// `SET` clause for a nullable text column whose value is bound through
/// [`clearable`].
pub fn clearable_assign(column: &str, placeholder: &str) -> String {
    format!(
        "{column} = CASE WHEN {placeholder}::text IS NULL THEN {column} \
         ELSE NULLIF({placeholder}::text, '') END"
    )
}

/// Turns blank optional text into `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
