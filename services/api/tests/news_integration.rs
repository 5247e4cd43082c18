//! Repository and router tests against a live database
//!
//! These tests need the PostgreSQL database described by `DATABASE_URL`
//! (and Redis at `REDIS_URL` for the HTTP flow), and are ignored by default.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use common::{
    accounts::{Account, NewAccount},
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool, run_migrations},
    models::{Role, Status},
    password::hash_password,
    token::{JwtConfig, JwtService},
};
use newsdesk_api::{
    AppState,
    dates::DateRange,
    models::{
        category::CategoryInput,
        news::{HistoryParams, NewsInput},
        tag::TagInput,
    },
    routes::create_router,
};
use serial_test::serial;
use tower::ServiceExt;

fn unique(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

async fn test_state() -> Result<AppState> {
    let pool = init_pool(&DatabaseConfig::from_env()?).await?;
    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig {
        secret: "an-hs256-test-secret-that-is-long-enough".to_string(),
        issuer: "newsdesk".to_string(),
        audience: "newsdesk-clients".to_string(),
        expiry_minutes: 5,
    });
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;

    Ok(AppState::new(pool, redis_pool, jwt_service))
}

async fn seed_staff(state: &AppState) -> Result<Account> {
    let account = state
        .account_repository
        .create(&NewAccount {
            email: format!("{}@newsdesk.local", unique("writer")),
            password_hash: hash_password("Abc123")?,
            full_name: "Integration Writer".to_string(),
            role: Role::Staff,
            status: Status::Active,
        })
        .await?;
    Ok(account)
}

fn article(title: &str, category_id: i32, tag_id: i32, status: Status) -> NewsInput {
    NewsInput {
        title: title.to_string(),
        content: format!("{} - long enough body text", title),
        category_id,
        status,
        tag_ids: vec![tag_id],
        is_featured: false,
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_history_filters_and_paging() -> Result<()> {
    let state = test_state().await?;
    let writer = seed_staff(&state).await?;

    let world = state
        .category_repository
        .create(&CategoryInput {
            name: unique("World"),
            description: None,
            status: Status::Active,
            order: None,
        })
        .await?;
    let sport = state
        .category_repository
        .create(&CategoryInput {
            name: unique("Sport"),
            description: None,
            status: Status::Active,
            order: None,
        })
        .await?;
    let tag = state
        .tag_repository
        .create(&TagInput {
            name: unique("tag"),
            description: None,
        })
        .await?;

    for (title, category, status) in [
        ("Election results are in", world.category_id, Status::Active),
        ("Markets rally on results", world.category_id, Status::Inactive),
        ("Cup final preview", sport.category_id, Status::Active),
    ] {
        state
            .news_repository
            .create(writer.id, &article(title, category, tag.tag_id, status))
            .await?;
    }

    let all = HistoryParams::default().validate()?;
    let (items, total) = state.news_repository.history(writer.id, &all).await?;
    assert_eq!(total, 3);
    assert_eq!(items.len(), 3);
    assert!(items.windows(2).all(|w| w[0].created_date >= w[1].created_date));
    assert_eq!(items[0].tags.len(), 1);

    let active = HistoryParams {
        status: Some(Status::Active),
        ..Default::default()
    }
    .validate()?;
    let (items, total) = state.news_repository.history(writer.id, &active).await?;
    assert_eq!(total, 2);
    assert!(items.iter().all(|n| n.status == Status::Active));

    let narrowed = HistoryParams {
        status: Some(Status::Active),
        search_term: Some("results".to_string()),
        ..Default::default()
    }
    .validate()?;
    let (_, narrowed_total) = state.news_repository.history(writer.id, &narrowed).await?;
    assert!(narrowed_total <= total);
    assert_eq!(narrowed_total, 1);

    let paged = HistoryParams {
        page: Some(2),
        page_size: Some(2),
        ..Default::default()
    }
    .validate()?;
    let (items, total) = state.news_repository.history(writer.id, &paged).await?;
    assert_eq!(total, 3);
    assert_eq!(items.len(), 1);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_view_count_and_delete_rules() -> Result<()> {
    let state = test_state().await?;
    let writer = seed_staff(&state).await?;

    let category = state
        .category_repository
        .create(&CategoryInput {
            name: unique("Tech"),
            description: Some("Gadgets".to_string()),
            status: Status::Active,
            order: None,
        })
        .await?;
    let tag = state
        .tag_repository
        .create(&TagInput {
            name: unique("rust"),
            description: None,
        })
        .await?;

    let active = state
        .news_repository
        .create(
            writer.id,
            &article("Rust 2024 ships", category.category_id, tag.tag_id, Status::Active),
        )
        .await?;
    let inactive = state
        .news_repository
        .create(
            writer.id,
            &article("Draft article", category.category_id, tag.tag_id, Status::Inactive),
        )
        .await?;

    assert_eq!(state.news_repository.increment_view(active.news_id).await?, Some(1));
    assert_eq!(state.news_repository.increment_view(active.news_id).await?, Some(2));
    assert_eq!(state.news_repository.increment_view(inactive.news_id).await?, None);

    let missing = state.tag_repository.missing_ids(&[tag.tag_id, -1]).await?;
    assert_eq!(missing, [-1]);

    let blocked = state.category_repository.delete(category.category_id).await;
    assert!(matches!(blocked, Err(ref e) if e.is_foreign_key_violation()));
    let blocked = state.tag_repository.delete(tag.tag_id).await;
    assert!(matches!(blocked, Err(ref e) if e.is_foreign_key_violation()));

    assert!(state.news_repository.delete(active.news_id).await?);
    assert!(state.news_repository.delete(inactive.news_id).await?);
    assert!(state.category_repository.delete(category.category_id).await?);
    assert!(!state.category_repository.delete(category.category_id).await?);
    assert!(state.tag_repository.delete(tag.tag_id).await?);
    assert!(state.account_repository.delete(writer.id).await?);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_reports_respect_range() -> Result<()> {
    let state = test_state().await?;

    let everything = state.report_repository.statistics(&DateRange::default()).await?;
    assert_eq!(
        everything.total_news,
        everything.active_news + everything.inactive_news
    );

    let future = DateRange {
        start: Some(Utc::now() + chrono::Duration::days(365)),
        end: None,
    };
    let empty = state.report_repository.news_statistics(&future).await?;
    assert_eq!(empty.total_news, 0);
    assert!(empty.category_statistics.is_empty());

    let trends = state.report_repository.news_trends(&DateRange::default()).await?;
    assert!(
        trends
            .windows(2)
            .all(|w| (w[0].year, w[0].month) < (w[1].year, w[1].month))
    );

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_staff_cannot_open_admin_reports() -> Result<()> {
    let state = test_state().await?;
    let writer = seed_staff(&state).await?;
    let token = state.jwt_service.generate(&writer)?;

    let request = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
    };

    let app = create_router(state.clone());
    let response = app.clone().oneshot(request("/reports/statistics")?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(request("/news/history")?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let claims = state.jwt_service.validate(&token)?;
    state.jwt_service.revoke(&state.redis_pool, &claims).await?;
    let response = app.oneshot(request("/news/history")?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert!(state.account_repository.delete(writer.id).await?);
    Ok(())
}
