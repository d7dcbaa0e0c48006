use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use kudos_api::{
    auth::{spawn_pruning_task, InMemoryRevocationStore, PgUserRepository, TokenRevocationStore},
    config::AppConfig,
    create_router, db, AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Kudos API - Starting...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!("Loaded configuration: {:?}", config);

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Process-local blacklist: not shared across instances, cleared on restart
    let revocations: Arc<dyn TokenRevocationStore> = Arc::new(InMemoryRevocationStore::new());
    let _pruner = spawn_pruning_task(revocations.clone(), config.prune_interval);

    let users = Arc::new(PgUserRepository::new(db_pool));
    let state = AppState::new(&config, users, revocations)
        .expect("Failed to initialise authentication services");

    if config.bootstrap_admin_enabled() {
        tracing::warn!("Development mode: first registered user will be promoted to ADMIN");
    }

    let app = create_router(state, config.environment);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Kudos API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Kudos API stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
