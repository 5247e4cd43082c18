//! Category models

use chrono::{DateTime, Utc};
use common::models::Status;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{check_length, check_optional_max, normalize_optional};
use crate::error::{ApiResult, FieldErrors};
use crate::odata::{EntitySchema, Field, FieldKind};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Category as returned by the API
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub category_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_date: DateTime<Utc>,
    pub news_count: i64,
}

/// Id and name only, for pickers
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category_id: i32,
    pub name: String,
}

/// Expects `categories` aliased as `c`
pub const CATEGORY_COLUMNS: &str = "c.id AS category_id, c.name, c.description, c.status, \
     c.sort_order, c.created_date, \
     (SELECT COUNT(*) FROM news n WHERE n.category_id = c.id) AS news_count";

pub static CATEGORY_SCHEMA: EntitySchema = EntitySchema {
    fields: &[
        Field::new("categoryId", "c.id", FieldKind::Int),
        Field::new("name", "c.name", FieldKind::Text),
        Field::new("description", "c.description", FieldKind::Text),
        Field::new("status", "c.status", FieldKind::Int),
        Field::new("order", "c.sort_order", FieldKind::Int),
        Field::new("createdDate", "c.created_date", FieldKind::DateTime),
        Field::new(
            "newsCount",
            "(SELECT COUNT(*) FROM news n WHERE n.category_id = c.id)",
            FieldKind::Int,
        ),
    ],
    key_column: "c.id",
    extra_properties: &[],
    expandable: &[],
};

fn active() -> Status {
    Status::Active
}

/// Request for creating a category
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to Active
    #[serde(default = "active")]
    pub status: Status,
    /// Defaults to after the last category
    pub order: Option<i32>,
}

/// Request for updating a category
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    /// Keeps the current position when omitted
    pub order: Option<i32>,
}

/// Checked category values ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
    pub order: Option<i32>,
}

fn check_category(
    name: String,
    description: Option<String>,
    status: Status,
    order: Option<i32>,
) -> ApiResult<CategoryInput> {
    let mut errors = FieldErrors::new();
    errors.check(
        "name",
        check_length("Category name", &name, MIN_NAME_LENGTH, MAX_NAME_LENGTH),
    );
    errors.check(
        "description",
        check_optional_max("Description", description.as_deref(), MAX_DESCRIPTION_LENGTH),
    );
    if matches!(order, Some(n) if n < 0) {
        errors.add("order", "Order must not be negative");
    }
    errors.into_result()?;

    Ok(CategoryInput {
        name: name.trim().to_string(),
        description: normalize_optional(description),
        status,
        order,
    })
}

impl CreateCategoryRequest {
    pub fn validate(self) -> ApiResult<CategoryInput> {
        check_category(self.name, self.description, self.status, self.order)
    }
}

impl UpdateCategoryRequest {
    pub fn validate(self) -> ApiResult<CategoryInput> {
        check_category(self.name, self.description, self.status, self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_create_defaults_to_active() {
        let request: CreateCategoryRequest =
            serde_json::from_str(r#"{"name": "World"}"#).unwrap();
        let input = request.validate().unwrap();
        assert_eq!(input.status, Status::Active);
        assert_eq!(input.order, None);
    }

    #[test]
    fn test_short_name_is_rejected() {
        let request: UpdateCategoryRequest =
            serde_json::from_str(r#"{"name": "W", "status": 0, "order": -1}"#).unwrap();
        match request.validate() {
            Err(ApiError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["name", "order"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_status_is_rejected() {
        let result =
            serde_json::from_str::<UpdateCategoryRequest>(r#"{"name": "World", "status": 4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_dto_uses_order_key() {
        let dto = CategoryDto {
            category_id: 1,
            name: "World".to_string(),
            description: None,
            status: Status::Active,
            sort_order: 3,
            created_date: Utc::now(),
            news_count: 2,
        };
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["order"], 3);
        assert_eq!(value["categoryId"], 1);
        assert_eq!(value["newsCount"], 2);
    }
}
