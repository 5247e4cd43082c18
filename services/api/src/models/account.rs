//! Account management and profile models

use common::models::{Role, Status};
use common::validation::{validate_email, validate_full_name, validate_password};
use serde::Deserialize;

use crate::error::{ApiResult, FieldErrors};
use crate::odata::{EntitySchema, Field, FieldKind};

pub use common::models::AccountDto;

pub static ACCOUNT_SCHEMA: EntitySchema = EntitySchema {
    fields: &[
        Field::new("accountId", "a.id", FieldKind::Int),
        Field::new("email", "a.email", FieldKind::Text),
        Field::new("fullName", "a.full_name", FieldKind::Text),
        Field::new("role", "a.role", FieldKind::Int),
        Field::new("status", "a.status", FieldKind::Int),
        Field::new("createdDate", "a.created_date", FieldKind::DateTime),
        Field::new("lastLoginDate", "a.last_login_date", FieldKind::DateTime),
        Field::new(
            "newsCount",
            "(SELECT COUNT(*) FROM news n WHERE n.account_id = a.id)",
            FieldKind::Int,
        ),
    ],
    key_column: "a.id",
    extra_properties: &[],
    expandable: &[],
};

fn active() -> Status {
    Status::Active
}

/// Request for creating an account from the admin screens
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default = "active")]
    pub status: Status,
}

impl CreateAccountRequest {
    /// Check the fields, returning the normalized email and full name
    pub fn validate(&self) -> ApiResult<(String, String)> {
        let email = self.email.trim();
        let full_name = self.full_name.trim();

        let mut errors = FieldErrors::new();
        errors.check("email", validate_email(email));
        errors.check("password", validate_password(&self.password));
        errors.check("fullName", validate_full_name(full_name));
        errors.into_result()?;

        Ok((email.to_string(), full_name.to_string()))
    }
}

/// Request for updating an account from the admin screens
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub full_name: String,
    pub role: Role,
    pub status: Status,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> ApiResult<String> {
        let full_name = self.full_name.trim();

        let mut errors = FieldErrors::new();
        errors.check("fullName", validate_full_name(full_name));
        errors.into_result()?;

        Ok(full_name.to_string())
    }
}

pub const MIN_PROFILE_NAME_LENGTH: usize = 2;

/// Self-service profile update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub current_password: String,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Checked profile update; the current password is verified separately
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInput {
    pub full_name: String,
    pub new_password: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> ApiResult<ProfileInput> {
        let full_name = self.full_name.trim();
        let new_password = self
            .new_password
            .as_deref()
            .filter(|password| !password.is_empty());

        let mut errors = FieldErrors::new();
        errors.check("fullName", validate_full_name(full_name));
        if !full_name.is_empty() && full_name.chars().count() < MIN_PROFILE_NAME_LENGTH {
            errors.add(
                "fullName",
                format!(
                    "Full name must be at least {} characters long",
                    MIN_PROFILE_NAME_LENGTH
                ),
            );
        }
        if self.current_password.is_empty() {
            errors.add("currentPassword", "Current password is required");
        }
        if let Some(password) = new_password {
            errors.check("newPassword", validate_password(password));
            if self.confirm_password.as_deref() != Some(password) {
                errors.add(
                    "confirmPassword",
                    "New password and confirmation password do not match",
                );
            }
        }
        errors.into_result()?;

        Ok(ProfileInput {
            full_name: full_name.to_string(),
            new_password: new_password.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn field_names(result: ApiResult<ProfileInput>) -> Vec<String> {
        match result {
            Err(ApiError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    fn profile(new_password: Option<&str>, confirm: Option<&str>) -> UpdateProfileRequest {
        UpdateProfileRequest {
            full_name: "Jane Doe".to_string(),
            current_password: "Secret1".to_string(),
            new_password: new_password.map(str::to_string),
            confirm_password: confirm.map(str::to_string),
        }
    }

    #[test]
    fn test_profile_without_new_password() {
        let input = profile(None, None).validate().unwrap();
        assert_eq!(input.new_password, None);

        let input = profile(Some(""), None).validate().unwrap();
        assert_eq!(input.new_password, None);
    }

    #[test]
    fn test_profile_password_must_match_confirmation() {
        assert_eq!(
            field_names(profile(Some("Better2"), Some("Better3")).validate()),
            ["confirmPassword"]
        );
        let input = profile(Some("Better2"), Some("Better2")).validate().unwrap();
        assert_eq!(input.new_password.as_deref(), Some("Better2"));
    }

    #[test]
    fn test_profile_new_password_follows_policy() {
        assert_eq!(
            field_names(profile(Some("weak"), Some("weak")).validate()),
            ["newPassword"]
        );
    }

    #[test]
    fn test_profile_requires_current_password() {
        let mut request = profile(None, None);
        request.current_password.clear();
        request.full_name = "J".to_string();
        assert_eq!(
            field_names(request.validate()),
            ["fullName", "currentPassword"]
        );
    }

    #[test]
    fn test_create_account_checks_every_field() {
        let request: CreateAccountRequest = serde_json::from_str(
            r#"{"email": "nope", "password": "abc", "fullName": "", "role": 1}"#,
        )
        .unwrap();
        assert_eq!(request.status, Status::Active);

        match request.validate() {
            Err(ApiError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
