//! HTTP server settings
//!
//! Defaults are layered under environment variables carrying the service's
//! prefix, e.g. `API_BIND_ADDR=0.0.0.0:8080` or
//! `AUTH_CORS_ORIGINS=https://cms.example.com,https://admin.example.com`.

use axum::http::{HeaderValue, Method, header};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "https://localhost:5173",
    "http://localhost:3000",
    "https://localhost:3000",
];

/// Bind address and allowed browser origins for one service
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
}

impl ServerSettings {
    /// Load settings for the service whose variables start with `prefix`
    pub fn load(prefix: &str, default_bind_addr: &str) -> Result<Self, ConfigError> {
        let default_origins: Vec<String> =
            DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect();

        Config::builder()
            .set_default("bind_addr", default_bind_addr)?
            .set_default("cors_origins", default_origins)?
            .add_source(
                Environment::with_prefix(prefix)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?
            .try_deserialize()
    }

    /// CORS layer allowing the configured origins with credentials
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        unsafe {
            std::env::remove_var("NDTEST_BIND_ADDR");
            std::env::remove_var("NDTEST_CORS_ORIGINS");
        }

        let settings = ServerSettings::load("NDTEST", "0.0.0.0:3001").unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:3001");
        assert_eq!(settings.cors_origins.len(), 4);
        assert!(
            settings
                .cors_origins
                .contains(&"http://localhost:5173".to_string())
        );
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("NDTEST_BIND_ADDR", "127.0.0.1:9000");
            std::env::set_var(
                "NDTEST_CORS_ORIGINS",
                "https://cms.example.com,https://admin.example.com",
            );
        }

        let settings = ServerSettings::load("NDTEST", "0.0.0.0:3001").unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:9000");
        assert_eq!(
            settings.cors_origins,
            vec![
                "https://cms.example.com".to_string(),
                "https://admin.example.com".to_string()
            ]
        );

        unsafe {
            std::env::remove_var("NDTEST_BIND_ADDR");
            std::env::remove_var("NDTEST_CORS_ORIGINS");
        }
    }
}
