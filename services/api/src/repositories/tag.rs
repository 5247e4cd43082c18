//! Tag repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{Page, push_odata_filter, push_search};
use crate::models::tag::{TAG_COLUMNS, TagDto, TagInput};
use crate::odata::ODataQuery;
use crate::odata::sql::{push_order_by, push_paging};

const DEFAULT_ORDER: &str = "t.name";
const SEARCH_COLUMNS: &[&str] = &["t.name", "COALESCE(t.description, '')"];

/// Tag repository for database operations
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

fn push_conditions(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &ODataQuery,
    search: Option<&str>,
) {
    builder.push(" FROM tags t WHERE TRUE");
    if let Some(term) = search {
        push_search(builder, SEARCH_COLUMNS, term);
    }
    push_odata_filter(builder, query);
}

impl TagRepository {
    /// Create a new tag repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List tags, optionally narrowed to a name/description search
    pub async fn list(&self, query: &ODataQuery, search: Option<&str>) -> DatabaseResult<Page<TagDto>> {
        let total = if query.count {
            let mut builder = QueryBuilder::new("SELECT COUNT(*)");
            push_conditions(&mut builder, query, search);
            let total: i64 = builder
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await
                .map_err(DatabaseError::Query)?;
            Some(total)
        } else {
            None
        };

        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(TAG_COLUMNS);
        push_conditions(&mut builder, query, search);
        push_order_by(&mut builder, &query.order_by, DEFAULT_ORDER, "t.id");
        push_paging(&mut builder, query.top, query.skip);

        let tags = builder
            .build_query_as::<TagDto>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok((tags, total))
    }

    /// Get a tag by ID
    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<TagDto>> {
        let sql = format!("SELECT {} FROM tags t WHERE t.id = $1", TAG_COLUMNS);

        sqlx::query_as::<_, TagDto>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Ids from `ids` that name no tag, in ascending order
    pub async fn missing_ids(&self, ids: &[i32]) -> DatabaseResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar(
            r#"
            SELECT u.id
            FROM unnest($1::int4[]) AS u(id)
            WHERE NOT EXISTS (SELECT 1 FROM tags t WHERE t.id = u.id)
            ORDER BY u.id
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Create a tag
    pub async fn create(&self, input: &TagInput) -> DatabaseResult<TagDto> {
        let sql = format!(
            "INSERT INTO tags AS t (name, description) VALUES ($1, $2) RETURNING {}",
            TAG_COLUMNS
        );

        sqlx::query_as::<_, TagDto>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Replace a tag's fields, `None` when it does not exist
    pub async fn update(&self, id: i32, input: &TagInput) -> DatabaseResult<Option<TagDto>> {
        let sql = format!(
            "UPDATE tags AS t SET name = $1, description = $2 WHERE t.id = $3 RETURNING {}",
            TAG_COLUMNS
        );

        sqlx::query_as::<_, TagDto>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Delete a tag, returning whether a row was removed
    ///
    /// Fails with a foreign key violation while the tag is attached to news.
    pub async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
