use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use autofinder_rust::{
    AppState,
    config::Settings,
    dataset::Dataset,
    routes,
    store::{JsonFileStore, KeyValueStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autofinder_rust=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing AutoFinder server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    let dataset = Dataset::load(&settings.data_dir)
        .with_context(|| format!("Failed to load mock dataset from {}", settings.data_dir.display()))?;

    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&settings.store_path)
            .with_context(|| format!("Failed to open client store at {}", settings.store_path.display()))?,
    );

    let app_state = AppState::from_settings(&settings, dataset, store);
    let app = routes::create_router(app_state);

    let addr: SocketAddr = settings
        .server_address
        .parse()
        .with_context(|| format!("Invalid server address format: {}", settings.server_address))?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
