//! Account management and profile endpoints

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use common::accounts::NewAccount;
use common::password::{hash_password, verify_password};
use tracing::{error, info};

use super::odata_response;
use crate::{
    AppState,
    error::{ApiError, ApiResult, FieldErrors},
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::Session,
    models::account::{
        ACCOUNT_SCHEMA, CreateAccountRequest, UpdateAccountRequest, UpdateProfileRequest,
    },
    odata::{ODataParams, ODataQuery},
};

const ACCOUNT_HAS_NEWS: &str = "Cannot delete account that has associated news articles.";
const EMAIL_EXISTS: &str = "Email already exists";

fn not_found() -> ApiError {
    ApiError::NotFound("Account not found".to_string())
}

fn hash(password: &str) -> ApiResult<String> {
    hash_password(password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        ApiError::InternalServerError
    })
}

/// List accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let query = ODataQuery::parse(&params, &ACCOUNT_SCHEMA)?;
    let (accounts, total) = state.account_repository.list(&query).await?;
    let accounts: Vec<_> = accounts.iter().map(|account| account.to_dto()).collect();

    odata_response((accounts, total), &query)
}

/// Get an account by ID
pub async fn get_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .account_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(account.to_dto()))
}

/// Create an account
pub async fn create_account(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let (email, full_name) = payload.validate()?;

    if state.account_repository.find_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest(EMAIL_EXISTS.to_string()));
    }

    let new_account = NewAccount {
        email,
        password_hash: hash(&payload.password)?,
        full_name,
        role: payload.role,
        status: payload.status,
    };

    let account = match state.account_repository.create(&new_account).await {
        Ok(account) => account,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::BadRequest(EMAIL_EXISTS.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    info!("Created account {} with role {}", account.id, account.role);
    Ok((StatusCode::CREATED, Json(account.to_dto())))
}

/// Update an account's name, role and status
pub async fn update_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    let full_name = payload.validate()?;

    let account = state
        .account_repository
        .update(id, &full_name, payload.role, payload.status)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(account.to_dto()))
}

/// Delete an account without news
pub async fn delete_account(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .account_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if account.news_count > 0 {
        return Err(ApiError::BadRequest(ACCOUNT_HAS_NEWS.to_string()));
    }

    match state.account_repository.delete(id).await {
        Ok(true) => {
            info!("Deleted account {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(not_found()),
        Err(e) if e.is_foreign_key_violation() => {
            Err(ApiError::BadRequest(ACCOUNT_HAS_NEWS.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// The caller's own account
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .account_repository
        .find_by_id(session.account_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(account.to_dto()))
}

/// Change the caller's name and, optionally, password
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;

    let account = state
        .account_repository
        .find_by_id(session.account_id)
        .await?
        .ok_or_else(not_found)?;

    if !verify_password(&payload.current_password, &account.password_hash) {
        let mut errors = FieldErrors::new();
        errors.add("currentPassword", "Current password is incorrect");
        errors.into_result()?;
    }

    let password_hash = match &input.new_password {
        Some(password) => Some(hash(password)?),
        None => None,
    };

    let account = state
        .account_repository
        .update_profile(session.account_id, &input.full_name, password_hash.as_deref())
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(account.to_dto()))
}
