use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod backend;
mod catalog;
mod config;
mod error;
mod gateway;
mod voices;

use api::routes::{create_router, AppState};
use backend::HttpBackend;
use config::Config;
use gateway::Gateway;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing::info!("Speaches gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", config.addr);
    tracing::info!("Backend: {}", config.backend_url);
    tracing::info!("Static files: {}", config.static_dir.display());

    let backend = Arc::new(HttpBackend::new(config.backend_url.clone()));
    let state = Arc::new(AppState {
        gateway: Gateway::new(backend),
    });

    let app = create_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
