//! Application state shared across handlers

use common::{cache::RedisPool, token::JwtService};
use sqlx::PgPool;

use crate::repositories::AccountRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub account_repository: AccountRepository,
}

impl AppState {
    pub fn new(db_pool: PgPool, redis_pool: RedisPool, jwt_service: JwtService) -> Self {
        Self {
            account_repository: AccountRepository::new(db_pool.clone()),
            db_pool,
            redis_pool,
            jwt_service,
        }
    }
}
