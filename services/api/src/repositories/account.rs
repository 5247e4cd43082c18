//! Account repository for the management and profile endpoints

use common::accounts::{self, ACCOUNT_COLUMNS, Account, NewAccount};
use common::error::{DatabaseError, DatabaseResult};
use common::models::{Role, Status};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use super::{Page, push_odata_filter};
use crate::odata::ODataQuery;
use crate::odata::sql::{push_order_by, push_paging};

const DEFAULT_ORDER: &str = "a.full_name";

/// Account repository for database operations
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List accounts with their news counts
    pub async fn list(&self, query: &ODataQuery) -> DatabaseResult<Page<Account>> {
        let total = if query.count {
            let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM accounts a WHERE TRUE");
            push_odata_filter(&mut builder, query);
            let total: i64 = builder
                .build_query_scalar()
                .fetch_one(&self.pool)
                .await
                .map_err(DatabaseError::Query)?;
            Some(total)
        } else {
            None
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(ACCOUNT_COLUMNS).push(" FROM accounts a WHERE TRUE");
        push_odata_filter(&mut builder, query);
        push_order_by(&mut builder, &query.order_by, DEFAULT_ORDER, "a.id");
        push_paging(&mut builder, query.top, query.skip);

        let accounts = builder
            .build_query_as::<Account>()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok((accounts, total))
    }

    pub async fn find_by_id(&self, id: i32) -> DatabaseResult<Option<Account>> {
        accounts::find_account_by_id(&self.pool, id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Account>> {
        accounts::find_account_by_email(&self.pool, email).await
    }

    pub async fn create(&self, account: &NewAccount) -> DatabaseResult<Account> {
        accounts::insert_account(&self.pool, account).await
    }

    /// Admin update of name, role and status, `None` when the account does not exist
    pub async fn update(
        &self,
        id: i32,
        full_name: &str,
        role: Role,
        status: Status,
    ) -> DatabaseResult<Option<Account>> {
        let sql = format!(
            "UPDATE accounts AS a SET full_name = $1, role = $2, status = $3 \
             WHERE a.id = $4 RETURNING {}",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(full_name)
            .bind(role)
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)
    }

    /// Profile update; the password hash is only replaced when given
    pub async fn update_profile(
        &self,
        id: i32,
        full_name: &str,
        password_hash: Option<&str>,
    ) -> DatabaseResult<Option<Account>> {
        let sql = format!(
            "UPDATE accounts AS a SET full_name = $1, \
             password_hash = COALESCE($2, a.password_hash) \
             WHERE a.id = $3 RETURNING {}",
            ACCOUNT_COLUMNS
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(full_name)
            .bind(password_hash)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        if account.is_some() && password_hash.is_some() {
            info!("Password changed for account {}", id);
        }

        Ok(account)
    }

    /// Delete an account, returning whether a row was removed
    ///
    /// Fails with a foreign key violation while the account owns news.
    pub async fn delete(&self, id: i32) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
