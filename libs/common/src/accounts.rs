//! Account persistence shared by the auth and api services

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{AccountDto, Role, Status};

/// Column list for account reads, `news_count` included
///
/// Expects the `accounts` table aliased as `a`.
pub const ACCOUNT_COLUMNS: &str = "a.id, a.email, a.password_hash, a.full_name, a.role, a.status, \
     a.created_date, a.last_login_date, \
     (SELECT COUNT(*) FROM news n WHERE n.account_id = a.id) AS news_count";

/// Account row
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub status: Status,
    pub created_date: DateTime<Utc>,
    pub last_login_date: Option<DateTime<Utc>>,
    pub news_count: i64,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn to_dto(&self) -> AccountDto {
        AccountDto {
            account_id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            status: self.status,
            created_date: self.created_date,
            last_login_date: self.last_login_date,
            news_count: self.news_count,
        }
    }
}

/// Values for a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub status: Status,
}

/// Insert an account
///
/// A duplicate email, in any letter case, surfaces as a
/// [`DatabaseError::Query`] for which [`DatabaseError::is_unique_violation`]
/// is true.
pub async fn insert_account(pool: &PgPool, account: &NewAccount) -> DatabaseResult<Account> {
    info!("Creating account: {}", account.email);

    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (email, password_hash, full_name, role, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, password_hash, full_name, role, status,
                  created_date, last_login_date, 0::BIGINT AS news_count
        "#,
    )
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(&account.full_name)
    .bind(account.role)
    .bind(account.status)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::Query)
}

/// Find an account by email, ignoring case
pub async fn find_account_by_email(pool: &PgPool, email: &str) -> DatabaseResult<Option<Account>> {
    let sql = format!(
        "SELECT {} FROM accounts a WHERE lower(a.email) = lower($1)",
        ACCOUNT_COLUMNS
    );

    sqlx::query_as::<_, Account>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::Query)
}

/// Find an account by id
pub async fn find_account_by_id(pool: &PgPool, id: i32) -> DatabaseResult<Option<Account>> {
    let sql = format!("SELECT {} FROM accounts a WHERE a.id = $1", ACCOUNT_COLUMNS);

    sqlx::query_as::<_, Account>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(DatabaseError::Query)
}

/// Stamp the account's last successful login
pub async fn record_login(pool: &PgPool, id: i32) -> DatabaseResult<()> {
    sqlx::query("UPDATE accounts SET last_login_date = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(DatabaseError::Query)?;

    Ok(())
}
