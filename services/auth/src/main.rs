use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    settings::ServerSettings,
    token::{JwtConfig, JwtService},
};
use newsdesk_auth::{
    AppState,
    bootstrap::{self, AdminBootstrap},
    routes,
};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting authentication service");

    let settings = ServerSettings::load("AUTH", "0.0.0.0:3000")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Initialize JWT service
    let jwt_service = JwtService::new(JwtConfig::from_env()?);

    // Initialize Redis client
    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;

    let app_state = AppState::new(pool, redis_pool, jwt_service);

    match AdminBootstrap::from_env() {
        Some(admin) => {
            bootstrap::ensure_admin_account(&app_state.account_repository, &admin).await?;
        }
        None => warn!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap"),
    }

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state)
        .layer(settings.cors_layer())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("Authentication service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
