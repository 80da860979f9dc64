//! Rule text and scope-field validation.
//!
//! Rule text is normalized before any check or write:
//! - Leading and trailing whitespace is trimmed
//! - Internal whitespace runs collapse to a single space
//!
//! After normalization the text must be 1 to 500 characters long.

use crate::model::RuleScope;
use std::path::Path;
use thiserror::Error;

/// Maximum rule text length in characters, counted after normalization.
pub const MAX_RULE_TEXT_CHARS: usize = 500;

/// Error type for rule validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Rule text is empty")]
    EmptyText,

    #[error("Rule text is too long: {length} characters (max {max})")]
    TooLong { length: usize, max: usize },

    #[error("Language-scoped rules need a language id")]
    MissingLanguageScope,

    #[error("Project-scoped rules need a project path")]
    MissingProjectPath,
}

/// Normalizes rule text: trims the ends and collapses every internal
/// whitespace run (spaces, tabs, newlines) to a single space.
///
/// # Examples
/// ```
/// use rulz::validate::normalize_rule_text;
///
/// assert_eq!(normalize_rule_text("  Prefer   iterators \n"), "Prefer iterators");
/// assert_eq!(normalize_rule_text("already normal"), "already normal");
/// ```
pub fn normalize_rule_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validates already-normalized rule text.
///
/// # Examples
/// ```
/// use rulz::validate::validate_rule_text;
///
/// assert!(validate_rule_text("Use snake_case").is_ok());
/// assert!(validate_rule_text("").is_err());
/// ```
pub fn validate_rule_text(text: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }

    let length = text.chars().count();
    if length > MAX_RULE_TEXT_CHARS {
        return Err(ValidationError::TooLong {
            length,
            max: MAX_RULE_TEXT_CHARS,
        });
    }

    Ok(())
}

/// Validates the scope-dependent fields of a rule about to be stored.
///
/// Language-scoped rules must carry a non-empty language id. Project-scoped
/// rules must carry a project path; defaulting the path from an open
/// workspace happens before this check.
pub fn validate_scope_fields(
    scope: &RuleScope,
    language_scope: Option<&str>,
    project_path: Option<&Path>,
) -> Result<(), ValidationError> {
    match scope {
        RuleScope::Language => match language_scope {
            Some(id) if !id.trim().is_empty() => Ok(()),
            _ => Err(ValidationError::MissingLanguageScope),
        },
        RuleScope::Project => match project_path {
            Some(_) => Ok(()),
            None => Err(ValidationError::MissingProjectPath),
        },
        RuleScope::Global | RuleScope::Custom(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalization_trims_and_collapses_whitespace() {
        assert_eq!(normalize_rule_text("  a   b  "), "a b");
        assert_eq!(normalize_rule_text("a\t\tb\nc"), "a b c");
        assert_eq!(normalize_rule_text("   "), "");
        assert_eq!(normalize_rule_text("plain"), "plain");
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(validate_rule_text(""), Err(ValidationError::EmptyText));
    }

    #[test]
    fn length_boundary_counts_characters_not_bytes() {
        let exactly_max = "é".repeat(MAX_RULE_TEXT_CHARS);
        assert!(validate_rule_text(&exactly_max).is_ok());

        let one_over = "é".repeat(MAX_RULE_TEXT_CHARS + 1);
        assert_eq!(
            validate_rule_text(&one_over),
            Err(ValidationError::TooLong {
                length: MAX_RULE_TEXT_CHARS + 1,
                max: MAX_RULE_TEXT_CHARS,
            })
        );
    }

    #[test]
    fn language_scope_requires_language_id() {
        assert_eq!(
            validate_scope_fields(&RuleScope::Language, None, None),
            Err(ValidationError::MissingLanguageScope)
        );
        assert_eq!(
            validate_scope_fields(&RuleScope::Language, Some("  "), None),
            Err(ValidationError::MissingLanguageScope)
        );
        assert!(validate_scope_fields(&RuleScope::Language, Some("rust"), None).is_ok());
    }

    #[test]
    fn project_scope_requires_project_path() {
        assert_eq!(
            validate_scope_fields(&RuleScope::Project, None, None),
            Err(ValidationError::MissingProjectPath)
        );
        let path = PathBuf::from("/work/app");
        assert!(validate_scope_fields(&RuleScope::Project, None, Some(&path)).is_ok());
    }

    #[test]
    fn global_and_custom_scopes_need_no_extra_fields() {
        assert!(validate_scope_fields(&RuleScope::Global, None, None).is_ok());
        let custom = RuleScope::Custom("frontend".to_string());
        assert!(validate_scope_fields(&custom, None, None).is_ok());
    }
}
