//! Category endpoints

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use super::odata_response;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{
        SearchParams,
        category::{CATEGORY_SCHEMA, CreateCategoryRequest, UpdateCategoryRequest},
    },
    odata::{ODataParams, ODataQuery},
};

const CATEGORY_HAS_NEWS: &str = "Cannot delete category that has associated news articles.";

fn not_found() -> ApiError {
    ApiError::NotFound("Category not found".to_string())
}

/// List categories
pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let query = ODataQuery::parse(&params, &CATEGORY_SCHEMA)?;
    let page = state.category_repository.list(&query, None).await?;
    odata_response(page, &query)
}

/// Categories whose name or description contains `term`
pub async fn search_categories(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<SearchParams>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let term = search
        .term()
        .ok_or_else(|| ApiError::BadRequest("Search term is required".to_string()))?;

    let query = ODataQuery::parse(&params, &CATEGORY_SCHEMA)?;
    let page = state.category_repository.list(&query, Some(term)).await?;
    odata_response(page, &query)
}

/// Active categories as id/name pairs
pub async fn list_simple(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let categories = state.category_repository.list_active_summaries().await?;
    Ok(Json(categories))
}

/// Get a category by ID
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let category = state
        .category_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(category))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;
    let category = state.category_repository.create(&input).await?;

    info!("Created category {} ({})", category.category_id, category.name);
    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace a category's fields
pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;

    let category = state
        .category_repository
        .update(id, &input)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(category))
}

/// Delete a category no news refers to
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let category = state
        .category_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if category.news_count > 0 {
        return Err(ApiError::BadRequest(CATEGORY_HAS_NEWS.to_string()));
    }

    match state.category_repository.delete(id).await {
        Ok(true) => {
            info!("Deleted category {}", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(not_found()),
        Err(e) if e.is_foreign_key_violation() => {
            Err(ApiError::BadRequest(CATEGORY_HAS_NEWS.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
