//! API models for request and response payloads
//!
//! Each entity module holds its response DTO, the OData schema of its
//! collection endpoint and the request bodies with their input checks.

use serde::Deserialize;

pub mod account;
pub mod category;
pub mod news;
pub mod report;
pub mod tag;

/// `?term=` of the search endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub term: Option<String>,
}

impl SearchParams {
    /// The trimmed term, `None` when missing or blank
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Character count check shared by the name/title rules
pub(crate) fn check_length(
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), String> {
    let length = value.trim().chars().count();
    if length == 0 {
        Err(format!("{} is required", label))
    } else if length < min || length > max {
        Err(format!(
            "{} must be between {} and {} characters",
            label, min, max
        ))
    } else {
        Ok(())
    }
}

/// Optional free text capped at `max` characters
pub(crate) fn check_optional_max(
    label: &str,
    value: Option<&str>,
    max: usize,
) -> Result<(), String> {
    match value {
        Some(text) if text.chars().count() > max => Err(format!(
            "{} must be at most {} characters long",
            label, max
        )),
        _ => Ok(()),
    }
}

/// Blank optional text is stored as NULL
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length() {
        assert!(check_length("Name", "ab", 2, 5).is_ok());
        assert_eq!(
            check_length("Name", "   ", 2, 5).unwrap_err(),
            "Name is required"
        );
        assert_eq!(
            check_length("Name", "a", 2, 5).unwrap_err(),
            "Name must be between 2 and 5 characters"
        );
        assert!(check_length("Name", "abcdef", 2, 5).is_err());
    }

    #[test]
    fn test_search_term_blank_is_absent() {
        let params = SearchParams {
            term: Some("  ".to_string()),
        };
        assert_eq!(params.term(), None);

        let params = SearchParams {
            term: Some(" rust ".to_string()),
        };
        assert_eq!(params.term(), Some("rust"));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some(" ".to_string())), None);
        assert_eq!(normalize_optional(Some(" x ".to_string())), Some("x".to_string()));
    }
}
