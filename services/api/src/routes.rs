//! API service routes
//!
//! Routes are grouped by the policy guarding them. Each guarded group layers
//! its role check inside [`auth_middleware`], so the session is in place
//! before the role is inspected.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{auth_middleware, require_admin, require_admin_or_staff, require_staff},
    odata::{ODataQuery, envelope},
    repositories::Page,
    state::AppState,
};

pub mod accounts;
pub mod categories;
pub mod news;
pub mod reports;
pub mod tags;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        .route(
            "/accounts/profile",
            get(accounts::get_profile).put(accounts::update_profile),
        )
        .route("/news/:id/increment-view", post(news::increment_view))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/:id",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/tags", post(tags::create_tag))
        .route("/tags/:id", put(tags::update_tag).delete(tags::delete_tag))
        .route("/news/statistics", get(news::statistics))
        .route("/reports/statistics", get(reports::statistics))
        .route("/reports/news-by-category", get(reports::news_by_category))
        .route("/reports/news-by-staff", get(reports::news_by_staff))
        .route("/reports/news-trends", get(reports::news_trends))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let staff_routes = Router::new()
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/news", post(news::create_news))
        .route(
            "/news/:id",
            put(news::update_news).delete(news::delete_news),
        )
        .route("/news/my-news", get(news::my_news))
        .route("/news/history", get(news::history))
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_or_staff_routes = Router::new()
        .route("/news/by-account/:account_id", get(news::by_account))
        .route("/news/filter-by-date", get(news::filter_by_date))
        .route_layer(middleware::from_fn(require_admin_or_staff))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(categories::list_categories))
        .route("/categories/simple", get(categories::list_simple))
        .route("/categories/search", get(categories::search_categories))
        .route("/categories/:id", get(categories::get_category))
        .route("/news", get(news::list_news))
        .route("/news/active", get(news::list_active))
        .route("/news/search", get(news::search_news))
        .route("/news/:id", get(news::get_news))
        .route("/tags", get(tags::list_tags))
        .route("/tags/search", get(tags::search_tags))
        .route("/tags/:id", get(tags::get_tag))
        .merge(authenticated_routes)
        .merge(admin_routes)
        .merge(staff_routes)
        .merge(admin_or_staff_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match common::database::health_check(&state.db_pool).await {
        Ok(true) => "ok",
        _ => "unavailable",
    };

    Json(json!({
        "status": "ok",
        "service": "api-service",
        "database": database,
    }))
}

/// Render a collection page in the OData envelope
pub(crate) fn odata_response<T: Serialize>(
    (items, total): Page<T>,
    query: &ODataQuery,
) -> ApiResult<Json<Value>> {
    envelope(&items, total, query.select.as_deref())
        .map(Json)
        .map_err(|e| {
            error!("Failed to serialize collection: {}", e);
            ApiError::InternalServerError
        })
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_json, request, send};
    use axum::{body::Body, http::{Request, StatusCode, header}};

    #[tokio::test]
    async fn test_guarded_routes_require_token() {
        for (method, uri) in [
            ("GET", "/accounts"),
            ("GET", "/accounts/profile"),
            ("POST", "/news"),
            ("PUT", "/news/1"),
            ("DELETE", "/categories/1"),
            ("GET", "/news/history"),
            ("GET", "/news/my-news"),
            ("GET", "/news/by-account/1"),
            ("GET", "/news/statistics"),
            ("GET", "/reports/news-trends"),
            ("POST", "/news/1/increment-view"),
            ("DELETE", "/tags/1"),
        ] {
            let response = send(request(method, uri)).await;
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{} {}",
                method,
                uri
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let response = send(
            Request::builder()
                .uri("/reports/statistics")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_health_reports_unavailable_database() {
        let response = send(request("GET", "/health")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "api-service");
    }
}
