//! Reporting aggregates

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// `GET /reports/statistics`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    pub total_news: i64,
    pub active_news: i64,
    pub inactive_news: i64,
    pub total_categories: i64,
    pub total_staff: i64,
    pub total_tags: i64,
}

/// `GET /reports/news-by-category`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    pub category_name: String,
    pub count: i64,
    pub active_count: i64,
    pub inactive_count: i64,
}

/// `GET /reports/news-by-staff`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffReport {
    pub staff_id: i32,
    pub staff_name: String,
    pub total_news: i64,
    pub active_news: i64,
    pub inactive_news: i64,
}

/// One month of `GET /reports/news-trends`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub year: i32,
    pub month: i32,
    pub count: i64,
    pub active_count: i64,
    pub inactive_count: i64,
}

/// Per-category row of `GET /news/statistics`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNewsStatistics {
    pub category_id: i32,
    pub category_name: String,
    pub news_count: i64,
    pub view_count: i64,
}

/// Per-author row of `GET /news/statistics`
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccountNewsStatistics {
    pub account_id: i32,
    pub full_name: String,
    pub news_count: i64,
    pub view_count: i64,
}

/// Totals part of `GET /news/statistics`
#[derive(Debug, Clone, Default, FromRow)]
pub struct NewsTotals {
    pub total_news: i64,
    pub active_news: i64,
    pub inactive_news: i64,
    pub featured_news: i64,
    pub total_views: i64,
}

/// `GET /news/statistics`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsStatistics {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub total_news: i64,
    pub active_news: i64,
    pub inactive_news: i64,
    pub featured_news: i64,
    pub total_views: i64,
    pub category_statistics: Vec<CategoryNewsStatistics>,
    pub account_statistics: Vec<AccountNewsStatistics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_statistics_keys() {
        let stats = NewsStatistics {
            start_date: None,
            end_date: None,
            total_news: 3,
            active_news: 2,
            inactive_news: 1,
            featured_news: 1,
            total_views: 40,
            category_statistics: vec![CategoryNewsStatistics {
                category_id: 1,
                category_name: "Tech".to_string(),
                news_count: 3,
                view_count: 40,
            }],
            account_statistics: Vec::new(),
        };

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["featuredNews"], 1);
        assert_eq!(value["categoryStatistics"][0]["viewCount"], 40);
        assert!(value["startDate"].is_null());
    }
}
