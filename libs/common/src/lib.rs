//! Common library for the Newsdesk services
//!
//! This crate provides the pieces shared by the auth and api services:
//! database connectivity and migrations, the Redis client used for token
//! revocation, domain enums, account persistence, password hashing, input
//! validation, the JWT service and server settings.

pub mod accounts;
pub mod cache;
pub mod database;
pub mod error;
pub mod models;
pub mod password;
pub mod settings;
pub mod token;
pub mod validation;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, init_pool, health_check, run_migrations};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     run_migrations(&pool).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
