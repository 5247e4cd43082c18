//! Tag models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{check_length, check_optional_max, normalize_optional};
use crate::error::{ApiResult, FieldErrors};
use crate::odata::{EntitySchema, Field, FieldKind};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Tag as returned by the API
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub tag_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_date: DateTime<Utc>,
    pub news_count: i64,
}

/// Tag reference attached to news items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TagSummary {
    pub tag_id: i32,
    pub name: String,
}

/// Expects `tags` aliased as `t`
pub const TAG_COLUMNS: &str = "t.id AS tag_id, t.name, t.description, t.created_date, \
     (SELECT COUNT(*) FROM news_tags nt WHERE nt.tag_id = t.id) AS news_count";

pub static TAG_SCHEMA: EntitySchema = EntitySchema {
    fields: &[
        Field::new("tagId", "t.id", FieldKind::Int),
        Field::new("name", "t.name", FieldKind::Text),
        Field::new("description", "t.description", FieldKind::Text),
        Field::new("createdDate", "t.created_date", FieldKind::DateTime),
        Field::new(
            "newsCount",
            "(SELECT COUNT(*) FROM news_tags nt WHERE nt.tag_id = t.id)",
            FieldKind::Int,
        ),
    ],
    key_column: "t.id",
    extra_properties: &[],
    expandable: &[],
};

/// Request for creating or updating a tag
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Checked tag values ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInput {
    pub name: String,
    pub description: Option<String>,
}

impl TagRequest {
    pub fn validate(self) -> ApiResult<TagInput> {
        let mut errors = FieldErrors::new();
        errors.check(
            "name",
            check_length("Tag name", &self.name, MIN_NAME_LENGTH, MAX_NAME_LENGTH),
        );
        errors.check(
            "description",
            check_optional_max(
                "Description",
                self.description.as_deref(),
                MAX_DESCRIPTION_LENGTH,
            ),
        );
        errors.into_result()?;

        Ok(TagInput {
            name: self.name.trim().to_string(),
            description: normalize_optional(self.description),
        })
    }
}
