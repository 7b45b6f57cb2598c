//! Alert Notifier Service - Main Entry Point

use notifier::{init_logging, NotifierConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = NotifierConfig::from_env()?;

    info!("=== Alert Notifier Service v{} ===", env!("CARGO_PKG_VERSION"));

    notifier::run(config).await
}
