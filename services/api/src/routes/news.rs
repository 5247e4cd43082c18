//! News endpoints

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use common::models::Status;
use serde_json::Value;
use tracing::info;

use super::odata_response;
use crate::{
    AppState,
    dates::{DateRange, DateRangeParams},
    error::{ApiError, ApiResult, FieldErrors},
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::Session,
    models::{
        SearchParams,
        news::{
            CreateNewsRequest, HistoryItem, HistoryPage, HistoryParams, NEWS_SCHEMA, NewsInput,
            UpdateNewsRequest, ViewCountResponse, total_pages,
        },
    },
    odata::{ODataParams, ODataQuery},
    repositories::news::NewsCriteria,
};

fn not_found() -> ApiError {
    ApiError::NotFound("News not found".to_string())
}

async fn list_with(
    state: &AppState,
    criteria: NewsCriteria,
    params: &ODataParams,
) -> ApiResult<Json<Value>> {
    let query = ODataQuery::parse(params, &NEWS_SCHEMA)?;
    let page = state.news_repository.list(criteria, &query).await?;
    odata_response(page, &query)
}

/// All news, any status
pub async fn list_news(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    list_with(&state, NewsCriteria::default(), &params).await
}

/// Active news only
pub async fn list_active(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let criteria = NewsCriteria {
        status: Some(Status::Active),
        ..Default::default()
    };
    list_with(&state, criteria, &params).await
}

/// Active news whose title, content or category name contains `term`
pub async fn search_news(
    State(state): State<AppState>,
    ApiQuery(search): ApiQuery<SearchParams>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let term = search
        .term()
        .ok_or_else(|| ApiError::BadRequest("Search term is required".to_string()))?;

    let criteria = NewsCriteria {
        status: Some(Status::Active),
        search: Some(term.to_string()),
        ..Default::default()
    };
    list_with(&state, criteria, &params).await
}

/// The caller's own news
pub async fn my_news(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let criteria = NewsCriteria {
        account_id: Some(session.account_id),
        ..Default::default()
    };
    list_with(&state, criteria, &params).await
}

/// News written by one account
pub async fn by_account(
    State(state): State<AppState>,
    ApiPath(account_id): ApiPath<i32>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    if state
        .account_repository
        .find_by_id(account_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Account not found".to_string()));
    }

    let criteria = NewsCriteria {
        account_id: Some(account_id),
        ..Default::default()
    };
    list_with(&state, criteria, &params).await
}

/// News created inside a closed date range
pub async fn filter_by_date(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRangeParams>,
    ApiQuery(params): ApiQuery<ODataParams>,
) -> ApiResult<impl IntoResponse> {
    let criteria = NewsCriteria {
        range: DateRange::closed_from_params(&range)?,
        ..Default::default()
    };
    list_with(&state, criteria, &params).await
}

/// Paginated history of the caller's own news, newest first
pub async fn history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> ApiResult<impl IntoResponse> {
    let query = params.validate()?;
    info!(
        "News history for account {}: page {}, page size {}",
        session.account_id, query.page, query.page_size
    );

    let (items, total_items) = state
        .news_repository
        .history(session.account_id, &query)
        .await?;

    Ok(Json(HistoryPage {
        total_items,
        total_pages: total_pages(total_items, query.page_size),
        current_page: query.page,
        page_size: query.page_size,
        items: items.into_iter().map(HistoryItem::from).collect(),
    }))
}

/// Totals and per-category/per-author breakdown
pub async fn statistics(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::from_params(&params)?;
    let statistics = state.report_repository.news_statistics(&range).await?;
    Ok(Json(statistics))
}

/// Get a news article by ID
pub async fn get_news(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let news = state
        .news_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(news))
}

/// Referenced category and tags must exist
async fn check_references(state: &AppState, input: &NewsInput) -> ApiResult<()> {
    let mut errors = FieldErrors::new();

    if !state.category_repository.exists(input.category_id).await? {
        errors.add("categoryId", "Category does not exist");
    }

    let missing = state.tag_repository.missing_ids(&input.tag_ids).await?;
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(ToString::to_string).collect();
        errors.add("tagIds", format!("Unknown tag ids: {}", ids.join(", ")));
    }

    errors.into_result()
}

/// Staff may only change their own articles
async fn check_owner(state: &AppState, session: &Session, id: i32) -> ApiResult<()> {
    let owner = state
        .news_repository
        .owner_of(id)
        .await?
        .ok_or_else(not_found)?;

    if owner != session.account_id {
        return Err(ApiError::Forbidden(
            "You can only modify your own news articles".to_string(),
        ));
    }

    Ok(())
}

/// Create a news article authored by the caller
pub async fn create_news(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(payload): ApiJson<CreateNewsRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;
    check_references(&state, &input).await?;

    let news = state
        .news_repository
        .create(session.account_id, &input)
        .await?;

    Ok((StatusCode::CREATED, Json(news)))
}

/// Replace an article's fields and tags
pub async fn update_news(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateNewsRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = payload.validate()?;
    check_owner(&state, &session, id).await?;
    check_references(&state, &input).await?;

    let news = state
        .news_repository
        .update(id, &input)
        .await?
        .ok_or_else(not_found)?;

    info!("Account {} updated news {}", session.account_id, id);
    Ok(Json(news))
}

/// Delete an article and its tag links
pub async fn delete_news(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    check_owner(&state, &session, id).await?;

    if !state.news_repository.delete(id).await? {
        return Err(not_found());
    }

    info!("Account {} deleted news {}", session.account_id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Add one view to an active article
pub async fn increment_view(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    match state.news_repository.increment_view(id).await? {
        Some(view_count) => Ok(Json(ViewCountResponse {
            news_id: id,
            view_count,
        })),
        None => match state.news_repository.owner_of(id).await? {
            Some(_) => Err(ApiError::BadRequest(
                "Cannot increment view count of an inactive news article".to_string(),
            )),
            None => Err(not_found()),
        },
    }
}
