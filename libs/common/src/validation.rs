//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_PASSWORD_LENGTH: usize = 100;
pub const MAX_FULL_NAME_LENGTH: usize = 100;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(format!(
            "Email must be at most {} characters long",
            MAX_EMAIL_LENGTH
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password against the account password policy
///
/// At least six characters with one uppercase letter, one lowercase letter
/// and one digit.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

/// Validate a required free-text field such as a name or title
pub fn validate_required_text(label: &str, value: &str, max_length: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }

    if value.chars().count() > max_length {
        return Err(format!(
            "{} must be at most {} characters long",
            label, max_length
        ));
    }

    Ok(())
}

/// Validate an account holder's full name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    validate_required_text("Full name", full_name, MAX_FULL_NAME_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email format".to_string())
        );
        assert_eq!(
            validate_email("a@x"),
            Err("Invalid email format".to_string())
        );
    }

    #[test]
    fn test_password_policy_messages_are_distinct() {
        let too_short = validate_password("Ab1").unwrap_err();
        let no_upper = validate_password("abc123").unwrap_err();
        let no_lower = validate_password("ABC123").unwrap_err();
        let no_digit = validate_password("Abcdef").unwrap_err();

        let messages = [&too_short, &no_upper, &no_lower, &no_digit];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }

        assert!(too_short.contains("at least 6"));
        assert!(no_upper.contains("uppercase"));
        assert!(no_lower.contains("lowercase"));
        assert!(no_digit.contains("digit"));
    }

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Abc123").is_ok());
        assert!(validate_password(&"Aa1".repeat(34)).is_err());
    }

    #[test]
    fn test_validate_required_text() {
        assert!(validate_required_text("Name", "Sports", 100).is_ok());
        assert_eq!(
            validate_required_text("Name", "   ", 100),
            Err("Name is required".to_string())
        );
        assert!(validate_required_text("Name", &"x".repeat(101), 100).is_err());
        assert!(validate_full_name("Jane Doe").is_ok());
    }
}
