//! `keel run`: start then stop the declared observers

use anyhow::Context as _;
use keel_core::KeelConfig;
use tracing::info;

use super::build_application;

/// Start all observers, then stop them
pub async fn execute(config: &KeelConfig) -> anyhow::Result<()> {
    let app = build_application(config)?;
    info!("Running {} observers", config.observers.len());

    app.start().await.context("Start failed")?;
    app.stop().await.context("Stop failed")?;
    Ok(())
}
