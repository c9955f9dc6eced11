//! Almanac API Server
//!
//! Run with: cargo run --bin almanac-api
//!
//! # Configuration
//!
//! Read from `config.toml` in the standard locations, then overridden by
//! environment variables:
//! - `ALMANAC_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `ALMANAC_API_PORT`: Port to listen on (default: 8000)
//! - `ALMANAC_DATA_DIR`: Where snapshots and the index are persisted
//! - `OPENAGENDA_API_KEY`, `OPENAGENDA_AGENDA_UID`: Catalog source
//! - `MISTRAL_API_KEY`: Embeddings and generation (offline fallbacks when unset)
//! - `MOCK_DATA`: Serve a synthetic event instead of calling OpenAgenda
//! - `ALMANAC_REBUILD_ON_START`: Rebuild when no persisted index is usable (default: false)
//! - `RUST_LOG`: Log filter (overrides `ALMANAC_LOG_LEVEL`)

use almanac::api::{serve, AppState};
use almanac::config::Config;
use almanac::logging::init_tracing;
use almanac::rag::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();

    // Initialize tracing
    init_tracing(&config.logging);

    tracing::info!("Starting Almanac API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {:?}", config.catalog.data_path());

    let services = Services::from_config(&config)?;

    if services.rebuilder.load_persisted().await {
        tracing::info!("Persisted index loaded");
    } else if rebuild_on_start() {
        tracing::info!("Building index at startup...");
        match services.rebuilder.rebuild().await {
            Ok(report) => tracing::info!(
                events = report.events,
                chunks = report.chunks,
                "Index built"
            ),
            Err(e) => tracing::warn!("Startup rebuild failed: {} (POST /api/v1/rebuild to retry)", e),
        }
    } else {
        tracing::info!("No index yet (POST /api/v1/rebuild to build one)");
    }

    // Run server
    let state = AppState::new(services, config.api.clone());
    serve(state, &config.api).await?;

    tracing::info!("Almanac API server stopped");

    Ok(())
}

fn rebuild_on_start() -> bool {
    std::env::var("ALMANAC_REBUILD_ON_START")
        .map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(false)
}
