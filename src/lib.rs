pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{PurchaseError, PurchaseProcessor};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

use crate::config::{AppConfig, StoreBackend};
use std::sync::Arc;

/// Connect the configured store and serve the API until the listener fails
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.database.backend {
        StoreBackend::Postgres => {
            log::info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let postgres_store = PostgresStore::new(&database_url, config.max_connections()).await?;

            log::info!("Running database migrations...");
            postgres_store.migrate().await?;

            serve(Arc::new(postgres_store), &config).await
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data will not survive a restart");
            serve(Arc::new(MemoryStore::new()), &config).await
        }
    }
}

async fn serve<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    use tokio::net::TcpListener;

    let app = crate::api::routes::build_app(store, &config.cors)?;

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!(
        "Coffee maker API running on http://{} (CORS origin {})",
        bind_address,
        config.cors.allowed_origin
    );

    axum::serve(listener, app).await?;

    Ok(())
}
