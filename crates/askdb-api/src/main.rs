//! Binary entrypoint for the askdb API server.
use anyhow::Context;
use askdb_api::{build_state, run, telemetry};
use askdb_core::AppConfig;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    // Optional YAML config; environment variables override it.
    let config_path = std::env::var_os("ASKDB_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let state = build_state(&config).await.context("starting pipeline")?;
    run(&config.server.addr, state).await.context("serving HTTP")?;
    Ok(())
}
