//! News article models

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::models::Status;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::category::CategorySummary;
use super::check_length;
use super::tag::TagSummary;
use crate::dates::{DateRange, DateRangeParams};
use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::odata::{EntitySchema, Field, FieldKind, ODataQuery};

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MIN_CONTENT_LENGTH: usize = 10;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Author reference attached on `$expand=account`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: i32,
    pub full_name: String,
}

/// News article as returned by the API
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NewsDto {
    pub news_id: i32,
    pub title: String,
    pub content: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub status: Status,
    pub category_id: i32,
    pub category_name: String,
    pub account_id: i32,
    pub account_name: String,
    pub view_count: i32,
    pub is_featured: bool,
    #[sqlx(skip)]
    pub tags: Vec<TagSummary>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountSummary>,
}

impl NewsDto {
    /// Fill the navigation summaries requested by `$expand`
    pub fn apply_expand(&mut self, query: &ODataQuery) {
        if query.expands("category") {
            self.category = Some(CategorySummary {
                category_id: self.category_id,
                name: self.category_name.clone(),
            });
        }
        if query.expands("account") {
            self.account = Some(AccountSummary {
                account_id: self.account_id,
                full_name: self.account_name.clone(),
            });
        }
    }
}

/// Column list for news reads
pub const NEWS_COLUMNS: &str = "n.id AS news_id, n.title, n.content, n.created_date, \
     n.updated_date, n.status, n.category_id, c.name AS category_name, n.account_id, \
     a.full_name AS account_name, n.view_count, n.is_featured";

/// `news n` joined with its category `c` and author `a`
pub const NEWS_FROM: &str = " FROM news n \
     JOIN categories c ON c.id = n.category_id \
     JOIN accounts a ON a.id = n.account_id";

pub static NEWS_SCHEMA: EntitySchema = EntitySchema {
    fields: &[
        Field::new("newsId", "n.id", FieldKind::Int),
        Field::new("title", "n.title", FieldKind::Text),
        Field::new("content", "n.content", FieldKind::Text),
        Field::new("createdDate", "n.created_date", FieldKind::DateTime),
        Field::new("updatedDate", "n.updated_date", FieldKind::DateTime),
        Field::new("status", "n.status", FieldKind::Int),
        Field::new("categoryId", "n.category_id", FieldKind::Int),
        Field::new("categoryName", "c.name", FieldKind::Text),
        Field::new("accountId", "n.account_id", FieldKind::Int),
        Field::new("accountName", "a.full_name", FieldKind::Text),
        Field::new("viewCount", "n.view_count", FieldKind::Int),
        Field::new("isFeatured", "n.is_featured", FieldKind::Bool),
    ],
    key_column: "n.id",
    extra_properties: &["tags"],
    expandable: &["category", "account"],
};

/// Request for creating a news article; new articles are Active
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: String,
    pub content: String,
    pub category_id: i32,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Request for updating a news article; the tag set is replaced
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub title: String,
    pub content: String,
    pub category_id: i32,
    pub status: Status,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Checked article values; category and tag existence is checked against
/// the database before writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    pub category_id: i32,
    pub status: Status,
    /// Sorted, without duplicates
    pub tag_ids: Vec<i32>,
    pub is_featured: bool,
}

fn check_news(
    title: &str,
    content: &str,
    category_id: i32,
    tag_ids: &[i32],
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();
    errors.check(
        "title",
        check_length("Title", title, MIN_TITLE_LENGTH, MAX_TITLE_LENGTH),
    );
    if content.trim().is_empty() {
        errors.add("content", "Content is required");
    } else if content.trim().chars().count() < MIN_CONTENT_LENGTH {
        errors.add(
            "content",
            format!("Content must be at least {} characters", MIN_CONTENT_LENGTH),
        );
    }
    if category_id <= 0 {
        errors.add("categoryId", "Category is required");
    }
    if tag_ids.is_empty() {
        errors.add("tagIds", "At least one tag is required");
    }
    errors.into_result()
}

fn distinct(ids: Vec<i32>) -> Vec<i32> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

impl CreateNewsRequest {
    pub fn validate(self) -> ApiResult<NewsInput> {
        check_news(&self.title, &self.content, self.category_id, &self.tag_ids)?;

        Ok(NewsInput {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            category_id: self.category_id,
            status: Status::Active,
            tag_ids: distinct(self.tag_ids),
            is_featured: self.is_featured,
        })
    }
}

impl UpdateNewsRequest {
    pub fn validate(self) -> ApiResult<NewsInput> {
        check_news(&self.title, &self.content, self.category_id, &self.tag_ids)?;

        Ok(NewsInput {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            category_id: self.category_id,
            status: self.status,
            tag_ids: distinct(self.tag_ids),
            is_featured: self.is_featured,
        })
    }
}

/// Response of the view counter endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCountResponse {
    pub news_id: i32,
    pub view_count: i32,
}

/// Query string of `GET /news/history`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search_term: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<Status>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validated history query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub page: i64,
    pub page_size: i64,
    pub search_term: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<Status>,
    pub range: DateRange,
}

impl HistoryParams {
    pub fn validate(self) -> ApiResult<HistoryQuery> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::BadRequest("page must be at least 1".to_string()));
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ApiError::BadRequest(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if (page - 1).checked_mul(page_size).is_none() {
            return Err(ApiError::BadRequest("page is out of range".to_string()));
        }

        let range = DateRange::from_params(&DateRangeParams {
            start_date: self.start_date,
            end_date: self.end_date,
        })?;

        Ok(HistoryQuery {
            page,
            page_size,
            search_term: self.search_term.filter(|term| !term.trim().is_empty()),
            category_id: self.category_id,
            status: self.status,
            range,
        })
    }
}

impl HistoryQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// Number of pages needed for `total_items`
pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}

/// One row of the news history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub news_id: i32,
    pub title: String,
    pub content: String,
    pub status: Status,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub view_count: i32,
    pub is_featured: bool,
    pub category: CategorySummary,
    pub tags: Vec<TagSummary>,
}

impl From<NewsDto> for HistoryItem {
    fn from(news: NewsDto) -> Self {
        HistoryItem {
            news_id: news.news_id,
            title: news.title,
            content: news.content,
            status: news.status,
            created_date: news.created_date,
            updated_date: news.updated_date,
            view_count: news.view_count,
            is_featured: news.is_featured,
            category: CategorySummary {
                category_id: news.category_id,
                name: news.category_name,
            },
            tags: news.tags,
        }
    }
}

/// One page of the news history
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub items: Vec<HistoryItem>,
}
