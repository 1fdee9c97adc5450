use inventory_api::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{self, PostgresRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, opens the datastore and serves
/// the HTTP API.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "inventory_api=debug,tower_http=info".into());

    // 3. Log format per environment: pretty locally, JSON for aggregators in production.
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

    // 4. Database Initialization (Postgres)
    // An unreachable database is logged inside connect_database; startup continues.
    let pool = repository::connect_database(&config.db_url).await;
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Router and Server Startup
    let port = config.port;
    let app = create_router(AppState { repo, config });

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address)
        .await
        .expect("FATAL: failed to bind the HTTP listener");

    tracing::info!("REST API listening on {}", address);
    tracing::info!("API Documentation available at: http://localhost:{}/docs", port);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly");
}
