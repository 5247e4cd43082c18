//! Login and registration against a live database
//!
//! These tests need the PostgreSQL database described by `DATABASE_URL` and
//! are ignored by default. Redis is configured but never contacted.

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::{
    accounts::{Account, NewAccount},
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool, run_migrations},
    models::{Role, Status},
    password::hash_password,
    token::{JwtConfig, JwtService},
};
use newsdesk_auth::{AppState, routes::create_router};
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

const PASSWORD: &str = "Abc123";

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

fn unique_email() -> String {
    format!("auth-{}@newsdesk.local", Uuid::new_v4().simple())
}

async fn seed_account(state: &AppState, role: Role, status: Status) -> Result<Account> {
    let account = state
        .account_repository
        .create(&NewAccount {
            email: unique_email(),
            password_hash: hash_password(PASSWORD)?,
            full_name: "Auth Tester".to_string(),
            role,
            status,
        })
        .await?;
    Ok(account)
}

async fn remove_account(state: &AppState, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;
    Ok(())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_login_issues_token_with_account_role() -> Result<()> {
    let state = test_state().await?;
    let app = create_router(state.clone());

    for role in [Role::Admin, Role::Staff] {
        let account = seed_account(&state, role, Status::Active).await?;

        let (status, body) = post_json(
            &app,
            "/auth/login",
            json!({ "email": account.email, "password": PASSWORD }),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tokenType"], "Bearer");

        let token = body["token"].as_str().unwrap_or_default();
        let claims = state.jwt_service.validate(token)?;
        assert_eq!(claims.role, role);
        assert_eq!(claims.account_id()?, account.id);
        assert!(body["account"]["lastLoginDate"].is_string());

        remove_account(&state, account.id).await?;
    }

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_login_email_ignores_case() -> Result<()> {
    let state = test_state().await?;
    let app = create_router(state.clone());
    let account = seed_account(&state, Role::Staff, Status::Active).await?;

    let (status, _) = post_json(
        &app,
        "/auth/login",
        json!({ "email": account.email.to_uppercase(), "password": PASSWORD }),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    remove_account(&state, account.id).await
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_login_rejects_wrong_password() -> Result<()> {
    let state = test_state().await?;
    let app = create_router(state.clone());
    let account = seed_account(&state, Role::Staff, Status::Active).await?;

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({ "email": account.email, "password": "Wrong123" }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");

    let (status, _) = post_json(
        &app,
        "/auth/login",
        json!({ "email": unique_email(), "password": PASSWORD }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    remove_account(&state, account.id).await
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_inactive_account_cannot_log_in() -> Result<()> {
    let state = test_state().await?;
    let app = create_router(state.clone());
    let account = seed_account(&state, Role::Staff, Status::Inactive).await?;

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({ "email": account.email, "password": PASSWORD }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Account is not active");

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({ "email": account.email, "password": "Wrong123" }),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    remove_account(&state, account.id).await
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_register_rejects_duplicate_email() -> Result<()> {
    let state = test_state().await?;
    let app = create_router(state.clone());
    let email = unique_email();

    let (status, body) = post_json(
        &app,
        "/auth/register",
        json!({ "email": email, "password": PASSWORD, "fullName": "First Writer" }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["role"], 1);
    assert_eq!(body["account"]["status"], 1);
    let id = body["account"]["accountId"].as_i64().unwrap_or_default() as i32;

    for duplicate in [email.clone(), email.to_uppercase()] {
        let (status, body) = post_json(
            &app,
            "/auth/register",
            json!({ "email": duplicate, "password": PASSWORD, "fullName": "Second Writer" }),
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already exists");
    }

    remove_account(&state, id).await
}
