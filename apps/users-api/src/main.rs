use axum_helpers::server::{ShutdownCoordinator, create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::OperationScope;
use database::mongodb::DocumentStore;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    info!(
        database = %config.mongodb.database,
        retries = config.mongodb.connect_retries,
        "Connecting to MongoDB"
    );

    // Connect to MongoDB with retry; the process aborts if every attempt fails
    let store = DocumentStore::connect_with_retry(&config.mongodb, None).await?;

    // Every request context expires after the operation timeout and is
    // canceled when shutdown gives up on draining
    let shutdown = ShutdownCoordinator::new();
    let scope = OperationScope::new(config.mongodb.operation_timeout(), shutdown.operations_token());

    let state = AppState {
        config,
        store,
        scope,
    };

    // Build router with API routes
    let api_routes = api::routes(&state);

    // Create a router with OpenAPI docs
    let router =
        create_router::<openapi::ApiDoc>(api_routes, &state.config.server.base_path).await?;

    // Merge health endpoints
    let app = router.merge(health_router(state.config.app));

    info!(
        base_path = %state.config.server.base_path,
        shutdown_timeout = ?state.config.server.shutdown_timeout,
        "Starting Users API"
    );

    let store = state.store.clone();
    create_production_app(app, &state.config.server, shutdown, async move {
        info!("Shutting down: closing MongoDB session");
        if store.disconnect().await {
            info!("MongoDB session closed");
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
