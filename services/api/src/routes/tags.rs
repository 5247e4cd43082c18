//! Tag endpoints

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
        tag::{TAG_SCHEMA, TagRequest},
    },
    odata::{ODataParams, ODataQuery},
};

const TAG_IN_USE: &str = "Cannot delete tag that is attached to news articles.";

fn not_found() -> ApiError {
    ApiError::NotFound("Tag not found".to_string())
}

/// List tags
pub async fn list_tags(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let query = ODataQuery::parse(&params, &TAG_SCHEMA)?;
    let page = state.tag_repository.list(&query, None).await?;
    odata_response(page, &query)
}

/// Tags whose name or description contains `term`
pub async fn search_tags(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<SearchParams>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let term = search
        .term()
        .ok_or_else(|| ApiError::BadRequest("Search term is required".to_string()))?;

    let query = ODataQuery::parse(&params, &TAG_SCHEMA)?;
    let page = state.tag_repository.list(&query, Some(term)).await?;
    odata_response(page, &query)
}

/// Get a tag by ID
pub async fn get_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(tag))
}

/// Create a tag
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TagRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;
    let tag = state.tag_repository.create(&input).await?;

    info!("Created tag {} ({})", tag.tag_id, tag.name);
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Replace a tag's name and description
pub async fn update_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<TagRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;

    let tag = state
        .tag_repository
        .update(id, &input)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(tag))
}

/// Delete a tag no news carries
pub async fn delete_tag(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .tag_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    if tag.news_count > 0 {
        return Err(ApiError::BadRequest(TAG_IN_USE.to_string()));
    }

    match state.tag_repository.delete(id).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(not_found()),
        Err(e) if e.is_foreign_key_violation() => Err(ApiError::BadRequest(TAG_IN_USE.to_string())),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{request, send};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_bad_count_value_is_bad_request() {
        let response = send(request("GET", "/tags?$count=maybe")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let response = send(request("POST", "/tags")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
