//! Domain enums and wire shapes shared by both services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Account role
///
/// Stored as `SMALLINT` and carried on the wire (JSON bodies and the token
/// role claim) as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum Role {
    Admin = 0,
    Staff = 1,
}

/// Activation status shared by accounts, categories and news articles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum Status {
    Inactive = 0,
    Active = 1,
}

/// Raised when an integer does not name a known enum variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnumRangeError {
    #[error("Invalid role {0} (0: Admin, 1: Staff)")]
    Role(i16),
    #[error("Invalid status {0} (0: Inactive, 1: Active)")]
    Status(i16),
}

impl Role {
    pub fn code(self) -> i16 {
        self as i16
    }
}

impl Status {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn is_active(self) -> bool {
        self == Status::Active
    }
}

impl TryFrom<i16> for Role {
    type Error = EnumRangeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Role::Admin),
            1 => Ok(Role::Staff),
            other => Err(EnumRangeError::Role(other)),
        }
    }
}

impl TryFrom<i16> for Status {
    type Error = EnumRangeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Inactive),
            1 => Ok(Status::Active),
            other => Err(EnumRangeError::Status(other)),
        }
    }
}

impl From<Role> for i16 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl From<Status> for i16 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("Admin"),
            Role::Staff => f.write_str("Staff"),
        }
    }
}

/// Account as returned by the API (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub account_id: i32,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub status: Status,
    pub created_date: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub news_count: i64,
}

/// Response of a successful login or registration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub account: AccountDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_numeric_code() {
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "1");
        assert_eq!(serde_json::from_str::<Role>("0").unwrap(), Role::Admin);
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(serde_json::from_str::<Role>("2").is_err());
        assert!(serde_json::from_str::<Status>("-1").is_err());
        assert_eq!(Status::try_from(3), Err(EnumRangeError::Status(3)));
    }

    #[test]
    fn test_status_is_active() {
        assert!(Status::Active.is_active());
        assert!(!Status::Inactive.is_active());
    }
}
