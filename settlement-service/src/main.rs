//! Settlement Service entry point.

use settlement_service::config::SettlementConfig;
use settlement_service::models::PurchaseSnapshot;
use settlement_service::services::metrics::init_metrics;
use settlement_service::services::InMemorySettlementStore;
use settlement_service::startup::Application;

use service_core::observability::init_tracing;
use std::path::Path;
use std::sync::Arc;

async fn load_seed(path: &Path) -> std::io::Result<Vec<PurchaseSnapshot>> {
    let raw = tokio::fs::read(path).await?;
    serde_json::from_slice(&raw).map_err(|e| {
        std::io::Error::other(format!("Invalid seed file {}: {}", path.display(), e))
    })
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = SettlementConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        version = %config.service_version,
        otlp_endpoint = ?config.otlp_endpoint,
        "Starting settlement-service"
    );

    init_metrics();

    tracing::info!(
        service_name = %config.service_name,
        http_port = %config.common.port,
        status_cache_ttl_secs = config.cache.status_ttl.as_secs(),
        allow_partial_refunds = config.refunds.allow_partial,
        "Configuration loaded"
    );

    let store = match &config.seed_file {
        Some(path) => {
            let snapshots = load_seed(path).await.map_err(|e| {
                tracing::error!(error = %e, path = %path.display(), "Failed to load seed file");
                e
            })?;
            tracing::info!(purchases = snapshots.len(), "Loaded seed purchases");
            InMemorySettlementStore::from_snapshots(snapshots)
        }
        None => {
            tracing::warn!("No SEED_FILE set, starting with an empty in-memory store");
            InMemorySettlementStore::new()
        }
    };

    let app = Application::build(config, Arc::new(store))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build application");
            std::io::Error::other(format!("Application build error: {}", e))
        })?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!(error = %e, "Application error");
        e
    })
}
