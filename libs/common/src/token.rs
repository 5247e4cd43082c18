//! JWT service for token generation, validation and revocation
//!
//! Tokens are HS256-signed and carry the account id, email, display name and
//! numeric role. Logging out revokes a token by storing its `jti` in Redis
//! for the rest of the token's lifetime.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::accounts::Account;
use crate::cache::RedisPool;
use crate::models::Role;

const MIN_SECRET_LENGTH: usize = 32;

/// Token failures
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT configuration error: {0}")]
    Configuration(String),

    #[error("Failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("Token subject is not an account id")]
    InvalidSubject,

    #[error("System clock is before the unix epoch")]
    Clock,

    #[error("Token revocation store error: {0}")]
    Revocation(#[source] anyhow::Error),
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HS256 secret
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Token lifetime in minutes
    pub expiry_minutes: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HS256 signing secret, at least 32 bytes (required)
    /// - `JWT_ISSUER`: Token issuer (default: "newsdesk")
    /// - `JWT_AUDIENCE`: Token audience (default: "newsdesk-clients")
    /// - `JWT_EXPIRY_MINUTES`: Token lifetime in minutes (default: 60)
    pub fn from_env() -> Result<Self, TokenError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| {
            TokenError::Configuration("JWT_SECRET environment variable not set".to_string())
        })?;

        if secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenError::Configuration(format!(
                "JWT_SECRET must be at least {} bytes",
                MIN_SECRET_LENGTH
            )));
        }

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "newsdesk".to_string());
        let audience =
            std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "newsdesk-clients".to_string());

        let expiry_minutes = std::env::var("JWT_EXPIRY_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|minutes| *minutes > 0)
            .unwrap_or(60);

        Ok(JwtConfig {
            secret,
            issuer,
            audience,
            expiry_minutes,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,
    pub email: String,
    /// Account full name
    pub name: String,
    pub role: Role,
    /// Token id, the revocation handle
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn account_id(&self) -> Result<i32, TokenError> {
        self.sub.parse().map_err(|_| TokenError::InvalidSubject)
    }
}

fn now_seconds() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Clock)
}

fn revocation_key(jti: &str) -> String {
    format!("revoked_token:{}", jti)
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Generate a signed token for an account
    pub fn generate(&self, account: &Account) -> Result<String, TokenError> {
        let now = now_seconds()?;

        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            name: account.full_name.clone(),
            role: account.role,
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now,
            exp: now + self.expiry_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)
    }

    /// Validate signature, issuer, audience and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    /// Revoke a token until it would have expired anyway
    pub async fn revoke(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<(), TokenError> {
        let remaining = claims.exp.saturating_sub(now_seconds()?);
        if remaining == 0 {
            return Ok(());
        }

        redis_pool
            .set(&revocation_key(&claims.jti), "1", Some(remaining))
            .await
            .map_err(TokenError::Revocation)?;

        info!("Revoked token {} for account {}", claims.jti, claims.sub);
        Ok(())
    }

    /// Check whether a token id has been revoked
    pub async fn is_revoked(&self, redis_pool: &RedisPool, jti: &str) -> Result<bool, TokenError> {
        redis_pool
            .exists(&revocation_key(jti))
            .await
            .map_err(TokenError::Revocation)
    }

    /// Token lifetime in seconds
    pub fn expiry_seconds(&self) -> u64 {
        self.config.expiry_minutes * 60
    }
}
