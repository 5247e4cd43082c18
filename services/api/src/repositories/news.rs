//! News repository for database operations

use std::collections::HashMap;

use common::error::{DatabaseError, DatabaseResult};
use common::models::Status;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{Page, push_date_range, push_search};
use crate::dates::DateRange;
use crate::models::news::{HistoryQuery, NEWS_COLUMNS, NEWS_FROM, NewsDto, NewsInput};
use crate::models::tag::TagSummary;
use crate::odata::sql::{push_order_by, push_paging, push_predicate};
use crate::odata::{ODataQuery, OrderBy, Predicate};

const DEFAULT_ORDER: &str = "n.created_date DESC";

/// Conjunctive conditions on the joined news rows; every field is optional
#[derive(Debug, Default, Clone)]
pub struct NewsCriteria {
    pub account_id: Option<i32>,
    pub status: Option<Status>,
    pub category_id: Option<i32>,
    /// Case-sensitive substring of title or content
    pub text: Option<String>,
    /// Case-insensitive substring of title, content or category name
    pub search: Option<String>,
    pub range: DateRange,
    pub filter: Option<Predicate>,
}

impl NewsCriteria {
    /// Criteria of the author's own history
    pub fn history(account_id: i32, query: &HistoryQuery) -> Self {
        NewsCriteria {
            account_id: Some(account_id),
            status: query.status,
            category_id: query.category_id,
            text: query.search_term.clone(),
            range: query.range,
            ..Default::default()
        }
    }

    fn push(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(NEWS_FROM).push(" WHERE TRUE");

        if let Some(account_id) = self.account_id {
            builder.push(" AND n.account_id = ").push_bind(account_id);
        }
        if let Some(status) = self.status {
            builder.push(" AND n.status = ").push_bind(status);
        }
        if let Some(category_id) = self.category_id {
            builder.push(" AND n.category_id = ").push_bind(category_id);
        }
        if let Some(text) = &self.text {
            builder
                .push(" AND (strpos(n.title, ")
                .push_bind(text.clone())
                .push(") > 0 OR strpos(n.content, ")
                .push_bind(text.clone())
                .push(") > 0)");
        }
        if let Some(term) = &self.search {
            push_search(builder, &["n.title", "n.content", "c.name"], term);
        }
        push_date_range(builder, "n.created_date", &self.range);
        if let Some(predicate) = &self.filter {
            builder.push(" AND ");
            push_predicate(builder, predicate);
        }
    }
}

#[derive(FromRow)]
struct NewsTagRow {
    news_id: i32,
    tag_id: i32,
    name: String,
}

/// News repository for database operations
#[derive(Clone)]
pub struct NewsRepository {
    pool: PgPool,
}

impl NewsRepository {
    /// Create a new news repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count the rows matching `criteria`
    pub async fn count(&self, criteria: &NewsCriteria) -> DatabaseResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        criteria.push(&mut builder);

        builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// One window of the rows matching `criteria`, tags attached
    pub async fn find(
        &self,
        criteria: &NewsCriteria,
        order_by: &[OrderBy],
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<NewsDto>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(NEWS_COLUMNS);
        criteria.push(&mut builder);
        push_order_by(&mut builder, order_by, DEFAULT_ORDER, "n.id");
        push_paging(&mut builder, limit, offset);

        let mut items = builder
            .build_query_as::<NewsDto>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        self.attach_tags(&mut items).await?;
        Ok(items)
    }

    /// OData listing on top of fixed `criteria`
    pub async fn list(
        &self,
        mut criteria: NewsCriteria,
        query: &ODataQuery,
    ) -> DatabaseResult<Page<NewsDto>> {
        criteria.filter = query.filter.clone();

        let total = if query.count {
            Some(self.count(&criteria).await?)
        } else {
            None
        };

        let mut items = self
            .find(&criteria, &query.order_by, query.top, query.skip)
            .await?;
        for item in &mut items {
            item.apply_expand(query);
        }

        Ok((items, total))
    }

    /// The author's news, newest first; the total counts every matching row
    pub async fn history(
        &self,
        account_id: i32,
        query: &HistoryQuery,
    ) -> DatabaseResult<(Vec<NewsDto>, i64)> {
        let criteria = NewsCriteria::history(account_id, query);

        let total = self.count(&criteria).await?;
        let items = self
            .find(&criteria, &[], query.page_size, query.offset())
            .await?;

        Ok((items, total))
    }

    /// Get a news article by ID
    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<NewsDto>> {
        let sql = format!("SELECT {}{} WHERE n.id = $1", NEWS_COLUMNS, NEWS_FROM);

        let news = sqlx::query_as::<_, NewsDto>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        match news {
            Some(news) => {
                let mut items = vec![news];
                self.attach_tags(&mut items).await?;
                Ok(items.pop())
            }
            None => Ok(None),
        }
    }

    /// Author of a news article
    pub async fn owner_of(&self, id: i32) -> DatabaseResult<Option<i32>> {
        sqlx::query_scalar("SELECT account_id FROM news WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Create an article and its tag links in one transaction
    pub async fn create(&self, account_id: i32, input: &NewsInput) -> DatabaseResult<NewsDto> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO news (title, content, status, category_id, account_id, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.status)
        .bind(input.category_id)
        .bind(account_id)
        .bind(input.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::Query)?;

        replace_tags(&mut *tx, id, &input.tag_ids).await?;
        tx.commit().await.map_err(DatabaseError::Query)?;

        info!("Account {} created news {}", account_id, id);
        self.find_by_id(id)
            .await?
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    /// Replace an article's fields and tag set, `None` when it does not exist
    pub async fn update(&self, id: i32, input: &NewsInput) -> DatabaseResult<Option<NewsDto>> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let result = sqlx::query(
            r#"
            UPDATE news
            SET title = $1, content = $2, status = $3, category_id = $4,
                is_featured = $5, updated_date = NOW()
            WHERE id = $6
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.status)
        .bind(input.category_id)
        .bind(input.is_featured)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::Query)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        replace_tags(&mut *tx, id, &input.tag_ids).await?;
        tx.commit().await.map_err(DatabaseError::Query)?;

        self.find_by_id(id).await
    }

    /// Delete an article and its tag links, returning whether it existed
    pub async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically add one view to an active article
    ///
    /// Returns the new count, or `None` when no active article has this id.
    pub async fn increment_view(&self, id: i32) -> DatabaseResult<Option<i32>> {
        sqlx::query_scalar(
            r#"
            UPDATE news
            SET view_count = view_count + 1
            WHERE id = $1 AND status = $2
            RETURNING view_count
            "#,
        )
        .bind(id)
        .bind(Status::Active)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn attach_tags(&self, items: &mut [NewsDto]) -> DatabaseResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let ids: Vec<i32> = items.iter().map(|item| item.news_id).collect();
        let rows = sqlx::query_as::<_, NewsTagRow>(
            r#"
            SELECT nt.news_id, t.id AS tag_id, t.name
            FROM news_tags nt
            JOIN tags t ON t.id = nt.tag_id
            WHERE nt.news_id = ANY($1)
            ORDER BY t.name, t.id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        let mut by_news: HashMap<i32, Vec<TagSummary>> = HashMap::new();
        for row in rows {
            by_news.entry(row.news_id).or_default().push(TagSummary {
                tag_id: row.tag_id,
                name: row.name,
            });
        }

        for item in items.iter_mut() {
            item.tags = by_news.remove(&item.news_id).unwrap_or_default();
        }

        Ok(())
    }
}

async fn replace_tags(conn: &mut PgConnection, news_id: i32, tag_ids: &[i32]) -> DatabaseResult<()> {
    sqlx::query("DELETE FROM news_tags WHERE news_id = $1")
        .bind(news_id)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::Query)?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query("INSERT INTO news_tags (news_id, tag_id) SELECT $1, unnest($2::int4[])")
        .bind(news_id)
        .bind(tag_ids.to_vec())
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odata::ODataParams;
    use crate::models::news::{HistoryParams, NEWS_SCHEMA};

    fn compiled(criteria: &NewsCriteria) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        criteria.push(&mut builder);
        builder.sql().to_string()
    }

    #[test]
    fn test_empty_criteria_only_joins() {
        assert_eq!(
            compiled(&NewsCriteria::default()),
            format!("SELECT COUNT(*){} WHERE TRUE", NEWS_FROM)
        );
    }

    #[test]
    fn test_history_criteria_are_conjunctive() {
        let query = HistoryParams {
            search_term: Some("rust".to_string()),
            category_id: Some(2),
            status: Some(Status::Active),
            start_date: Some("2024-01-01".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let sql = compiled(&NewsCriteria::history(7, &query));
        assert!(sql.ends_with(
            " WHERE TRUE AND n.account_id = $1 AND n.status = $2 AND n.category_id = $3 \
             AND (strpos(n.title, $4) > 0 OR strpos(n.content, $5) > 0) \
             AND n.created_date >= $6"
        ));
    }

    #[test]
    fn test_odata_filter_is_appended_last() {
        let params = ODataParams {
            filter: Some("categoryName eq 'Tech' or isFeatured eq true".to_string()),
            ..Default::default()
        };
        let query = ODataQuery::parse(&params, &NEWS_SCHEMA).unwrap();
        let criteria = NewsCriteria {
            status: Some(Status::Active),
            filter: query.filter,
            ..Default::default()
        };

        assert!(compiled(&criteria).ends_with(
            "AND n.status = $1 AND (c.name = $2 OR n.is_featured = $3)"
        ));
    }

    #[test]
    fn test_search_covers_category_name() {
        let criteria = NewsCriteria {
            search: Some("Tech".to_string()),
            ..Default::default()
        };
        assert!(compiled(&criteria).contains("strpos(lower(c.name), $3) > 0"));
    }
}
