//! Transaction Ingestion Service - Main Entry Point

use api::{init_logging, ApiConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    // Configuration problems are fatal before any request is served
    let config = ApiConfig::from_env()?;

    info!(
        "=== Transaction Ingestion Service v{} ===",
        env!("CARGO_PKG_VERSION")
    );

    PrometheusBuilder::new()
        .with_http_listener(config.metrics_socket_addr()?)
        .install()?;

    api::run_server(config).await
}
