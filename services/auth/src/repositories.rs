//! Account repository for the authentication service

use common::accounts::{
    Account, NewAccount, find_account_by_email, insert_account, record_login,
};
use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;

/// Account repository
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new account
    pub async fn create(&self, account: &NewAccount) -> DatabaseResult<Account> {
        insert_account(&self.pool, account).await
    }

    /// Find an account by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Account>> {
        info!("Finding account by email: {}", email);
        find_account_by_email(&self.pool, email).await
    }

    /// Record a successful login
    pub async fn record_login(&self, id: i32) -> DatabaseResult<()> {
        record_login(&self.pool, id).await
    }
}
