//! Category repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use common::models::Status;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{Page, push_odata_filter, push_search};
use crate::models::category::{CATEGORY_COLUMNS, CategoryDto, CategoryInput, CategorySummary};
use crate::odata::ODataQuery;
use crate::odata::sql::{push_order_by, push_paging};

const DEFAULT_ORDER: &str = "c.sort_order, c.name";
const SEARCH_COLUMNS: &[&str] = &["c.name", "COALESCE(c.description, '')"];

/// Category repository for database operations
#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

fn push_conditions(
    builder: &mut QueryBuilder<'_, Postgres>,
    query: &ODataQuery,
    search: Option<&str>,
) {
    builder.push(" FROM categories c WHERE TRUE");
    if let Some(term) = search {
        push_search(builder, SEARCH_COLUMNS, term);
    }
    push_odata_filter(builder, query);
}

impl CategoryRepository {
    /// Create a new category repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List categories, optionally narrowed to a name/description search
    pub async fn list(
        &self,
        query: &ODataQuery,
        search: Option<&str>,
    ) -> DatabaseResult<Page<CategoryDto>> {
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
        builder.push(CATEGORY_COLUMNS);
        push_conditions(&mut builder, query, search);
        push_order_by(&mut builder, &query.order_by, DEFAULT_ORDER, "c.id");
        push_paging(&mut builder, query.top, query.skip);

        let categories = builder
            .build_query_as::<CategoryDto>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok((categories, total))
    }

    /// Active categories as id/name pairs
    pub async fn list_active_summaries(&self) -> DatabaseResult<Vec<CategorySummary>> {
        sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT id AS category_id, name
            FROM categories
            WHERE status = $1
            ORDER BY sort_order, name, id
            "#,
        )
        .bind(Status::Active)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    /// Get a category by ID
    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<CategoryDto>> {
        let sql = format!("SELECT {} FROM categories c WHERE c.id = $1", CATEGORY_COLUMNS);

        sqlx::query_as::<_, CategoryDto>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    pub async fn exists(&self, id: i32) -> DatabaseResult<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Create a category; without an explicit order it goes last
    pub async fn create(&self, input: &CategoryInput) -> DatabaseResult<CategoryDto> {
        let sql = format!(
            r#"
            INSERT INTO categories AS c (name, description, status, sort_order)
            VALUES ($1, $2, $3,
                    COALESCE($4, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM categories)))
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, CategoryDto>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status)
            .bind(input.order)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Replace a category's fields, `None` when it does not exist
    pub async fn update(&self, id: i32, input: &CategoryInput) -> DatabaseResult<Option<CategoryDto>> {
        let sql = format!(
            r#"
            UPDATE categories AS c
            SET name = $1, description = $2, status = $3, sort_order = COALESCE($4, c.sort_order)
            WHERE c.id = $5
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, CategoryDto>(&sql)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status)
            .bind(input.order)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Delete a category, returning whether a row was removed
    ///
    /// Fails with a foreign key violation while news still reference it.
    pub async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
