//! Fraud Detection Service - Main Entry Point

use detector::{init_logging, DetectorConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Configuration problems are fatal before any consumption starts
    let config = DetectorConfig::from_env()?;

    info!("=== Fraud Detection Service v{} ===", env!("CARGO_PKG_VERSION"));

    PrometheusBuilder::new()
        .with_http_listener(config.metrics_socket_addr()?)
        .install()?;

    detector::run(config).await
}
