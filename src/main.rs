use blog_api::{
    AppState,
    cache::{RESPONSE_TTL, ResponseCache},
    config::{AppConfig, Env},
    create_router,
    repository::{RepositoryState, SqliteRepository},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, opens and migrates the database,
/// then serves the API until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration
    dotenv::dotenv().ok();
    // Fails fast when production runs without TOKEN_SECRET or PORT is garbage.
    let config = AppConfig::load()?;

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_api=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database
    let sqlite = SqliteRepository::connect(&config.database_url).await?;
    sqlite.migrate().await?;
    tracing::info!(database = %config.database_url, "database ready");

    let repo = Arc::new(sqlite) as RepositoryState;

    // 4. Response cache
    let cache = ResponseCache::new(RESPONSE_TTL, !config.skip_cache);
    if !cache.is_enabled() {
        tracing::info!("response cache disabled (SKIP_CACHE)");
    }

    // 5. Router and server
    let addr = format!("0.0.0.0:{}", config.port);
    let app = create_router(AppState::new(repo, cache, config));

    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Listening on {addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
