//! Collector Replay - Main Entry Point

use collector_replay::{init_logging, run_replay, ReplayConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = ReplayConfig::load(path.as_deref())?;

    init_logging(&config.log_level, config.json_logs)?;

    info!("=== Collector Replay v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Replaying {:?} at {} Hz for {} s",
        config.sensor, config.sample_rate_hz, config.duration_secs
    );

    let summary = run_replay(&config).await?;
    info!("Replay finished: {}", serde_json::to_string(&summary)?);

    Ok(())
}
