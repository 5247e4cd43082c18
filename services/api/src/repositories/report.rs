//! Aggregate queries behind the reporting endpoints
//!
//! Every report is recomputed from the news table on each call; the optional
//! date range applies to `news.created_date`.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::push_date_range;
use crate::dates::DateRange;
use crate::models::report::{
    AccountNewsStatistics, CategoryNewsStatistics, CategoryReport, NewsStatistics, NewsTotals,
    ReportStatistics, StaffReport, TrendPoint,
};

/// Report repository for database operations
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

fn news_in_range<'a>(select: &str, range: &DateRange) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(select);
    builder.push(" WHERE TRUE");
    push_date_range(&mut builder, "n.created_date", range);
    builder
}

impl ReportRepository {
    /// Create a new report repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// News totals in range plus global category, staff and tag counts
    pub async fn statistics(&self, range: &DateRange) -> DatabaseResult<ReportStatistics> {
        let mut builder = news_in_range(
            r#"
            SELECT COUNT(*) AS total_news,
                   COUNT(*) FILTER (WHERE n.status = 1) AS active_news,
                   COUNT(*) FILTER (WHERE n.status = 0) AS inactive_news,
                   (SELECT COUNT(*) FROM categories) AS total_categories,
                   (SELECT COUNT(*) FROM accounts WHERE role = 1) AS total_staff,
                   (SELECT COUNT(*) FROM tags) AS total_tags
            FROM news n
            "#,
            range,
        );

        builder
            .build_query_as::<ReportStatistics>()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// News counts per category, largest first
    pub async fn news_by_category(&self, range: &DateRange) -> DatabaseResult<Vec<CategoryReport>> {
        let mut builder = news_in_range(
            r#"
            SELECT c.name AS category_name,
                   COUNT(*) AS count,
                   COUNT(*) FILTER (WHERE n.status = 1) AS active_count,
                   COUNT(*) FILTER (WHERE n.status = 0) AS inactive_count
            FROM news n
            JOIN categories c ON c.id = n.category_id
            "#,
            range,
        );
        builder.push(" GROUP BY c.id, c.name ORDER BY count DESC, c.name");

        builder
            .build_query_as::<CategoryReport>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// News counts per author, largest first
    pub async fn news_by_staff(&self, range: &DateRange) -> DatabaseResult<Vec<StaffReport>> {
        let mut builder = news_in_range(
            r#"
            SELECT a.id AS staff_id,
                   a.full_name AS staff_name,
                   COUNT(*) AS total_news,
                   COUNT(*) FILTER (WHERE n.status = 1) AS active_news,
                   COUNT(*) FILTER (WHERE n.status = 0) AS inactive_news
            FROM news n
            JOIN accounts a ON a.id = n.account_id
            "#,
            range,
        );
        builder.push(" GROUP BY a.id, a.full_name ORDER BY total_news DESC, a.full_name");

        builder
            .build_query_as::<StaffReport>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Monthly counts in chronological order, months taken in UTC
    pub async fn news_trends(&self, range: &DateRange) -> DatabaseResult<Vec<TrendPoint>> {
        let mut builder = news_in_range(
            r#"
            SELECT EXTRACT(YEAR FROM n.created_date AT TIME ZONE 'UTC')::INT AS year,
                   EXTRACT(MONTH FROM n.created_date AT TIME ZONE 'UTC')::INT AS month,
                   COUNT(*) AS count,
                   COUNT(*) FILTER (WHERE n.status = 1) AS active_count,
                   COUNT(*) FILTER (WHERE n.status = 0) AS inactive_count
            FROM news n
            "#,
            range,
        );
        builder.push(" GROUP BY 1, 2 ORDER BY 1, 2");

        builder
            .build_query_as::<TrendPoint>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Totals, views and per-category/per-author breakdown of news in range
    pub async fn news_statistics(&self, range: &DateRange) -> DatabaseResult<NewsStatistics> {
        let mut totals = news_in_range(
            r#"
            SELECT COUNT(*) AS total_news,
                   COUNT(*) FILTER (WHERE n.status = 1) AS active_news,
                   COUNT(*) FILTER (WHERE n.status = 0) AS inactive_news,
                   COUNT(*) FILTER (WHERE n.is_featured) AS featured_news,
                   COALESCE(SUM(n.view_count), 0)::BIGINT AS total_views
            FROM news n
            "#,
            range,
        );
        let totals = totals
            .build_query_as::<NewsTotals>()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let mut by_category = news_in_range(
            r#"
            SELECT c.id AS category_id,
                   c.name AS category_name,
                   COUNT(*) AS news_count,
                   COALESCE(SUM(n.view_count), 0)::BIGINT AS view_count
            FROM news n
            JOIN categories c ON c.id = n.category_id
            "#,
            range,
        );
        by_category.push(" GROUP BY c.id, c.name ORDER BY news_count DESC, c.name");
        let category_statistics = by_category
            .build_query_as::<CategoryNewsStatistics>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        let mut by_account = news_in_range(
            r#"
            SELECT a.id AS account_id,
                   a.full_name,
                   COUNT(*) AS news_count,
                   COALESCE(SUM(n.view_count), 0)::BIGINT AS view_count
            FROM news n
            JOIN accounts a ON a.id = n.account_id
            "#,
            range,
        );
        by_account.push(" GROUP BY a.id, a.full_name ORDER BY news_count DESC, a.full_name");
        let account_statistics = by_account
            .build_query_as::<AccountNewsStatistics>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(NewsStatistics {
            start_date: range.start,
            end_date: range.end,
            total_news: totals.total_news,
            active_news: totals.active_news,
            inactive_news: totals.inactive_news,
            featured_news: totals.featured_news,
            total_views: totals.total_views,
            category_statistics,
            account_statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_range_applies_before_grouping() {
        let range = DateRange {
            start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            end: None,
        };
        let mut builder = news_in_range("SELECT COUNT(*) FROM news n", &range);
        builder.push(" GROUP BY 1");
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM news n WHERE TRUE AND n.created_date >= $1 GROUP BY 1"
        );
    }
}
