//! Reporting endpoints, recomputed on every request

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use crate::{
    AppState,
    dates::{DateRange, DateRangeParams},
    error::ApiResult,
    extract::ApiQuery,
};

/// News totals plus category, staff and tag counts
pub async fn statistics(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::from_params(&params)?;
    Ok(Json(state.report_repository.statistics(&range).await?))
}

pub async fn news_by_category(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::from_params(&params)?;
    Ok(Json(state.report_repository.news_by_category(&range).await?))
}

pub async fn news_by_staff(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::from_params(&params)?;
    Ok(Json(state.report_repository.news_by_staff(&range).await?))
}

/// Monthly counts, oldest month first
pub async fn news_trends(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DateRangeParams>,
) -> ApiResult<impl IntoResponse> {
    let range = DateRange::from_params(&params)?;
    Ok(Json(state.report_repository.news_trends(&range).await?))
}
