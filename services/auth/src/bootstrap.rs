//! First-run admin account

use anyhow::{Result, anyhow};
use common::accounts::NewAccount;
use common::models::{Role, Status};
use common::password::hash_password;
use common::validation::{validate_email, validate_full_name, validate_password};
use tracing::info;

use crate::repositories::AccountRepository;

/// Admin account to create at startup
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl AdminBootstrap {
    /// Read the bootstrap admin from environment variables
    ///
    /// # Environment Variables
    /// - `ADMIN_EMAIL`: Admin login email
    /// - `ADMIN_PASSWORD`: Admin password, checked against the password policy
    /// - `ADMIN_FULL_NAME`: Display name (default: "Administrator")
    ///
    /// Returns `None` unless both the email and the password are set.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var("ADMIN_EMAIL").ok().filter(|s| !s.trim().is_empty())?;
        let password = std::env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty())?;
        let full_name =
            std::env::var("ADMIN_FULL_NAME").unwrap_or_else(|_| "Administrator".to_string());

        Some(Self {
            email,
            password,
            full_name,
        })
    }

    fn validate(&self) -> Result<()> {
        validate_email(&self.email).map_err(|e| anyhow!("ADMIN_EMAIL: {}", e))?;
        validate_password(&self.password).map_err(|e| anyhow!("ADMIN_PASSWORD: {}", e))?;
        validate_full_name(&self.full_name).map_err(|e| anyhow!("ADMIN_FULL_NAME: {}", e))?;
        Ok(())
    }
}

/// Create the bootstrap admin unless an account with that email exists
///
/// Returns true when an account was created.
pub async fn ensure_admin_account(
    repository: &AccountRepository,
    admin: &AdminBootstrap,
) -> Result<bool> {
    admin.validate()?;

    if repository.find_by_email(&admin.email).await?.is_some() {
        info!("Admin account {} already exists", admin.email);
        return Ok(false);
    }

    let account = repository
        .create(&NewAccount {
            email: admin.email.clone(),
            password_hash: hash_password(&admin.password)?,
            full_name: admin.full_name.clone(),
            role: Role::Admin,
            status: Status::Active,
        })
        .await?;

    info!("Created admin account {} ({})", account.email, account.id);
    Ok(true)
}
