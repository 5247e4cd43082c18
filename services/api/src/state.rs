//! Application state shared across handlers

use common::{cache::RedisPool, token::JwtService};
use sqlx::PgPool;

use crate::repositories::{
    AccountRepository, CategoryRepository, NewsRepository, ReportRepository, TagRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub account_repository: AccountRepository,
    pub category_repository: CategoryRepository,
    pub news_repository: NewsRepository,
    pub tag_repository: TagRepository,
    pub report_repository: ReportRepository,
}

impl AppState {
    /// Build the state and one repository per entity over a shared pool
    pub fn new(db_pool: PgPool, redis_pool: RedisPool, jwt_service: JwtService) -> Self {
        Self {
            account_repository: AccountRepository::new(db_pool.clone()),
            category_repository: CategoryRepository::new(db_pool.clone()),
            news_repository: NewsRepository::new(db_pool.clone()),
            tag_repository: TagRepository::new(db_pool.clone()),
            report_repository: ReportRepository::new(db_pool.clone()),
            db_pool,
            redis_pool,
            jwt_service,
        }
    }
}
