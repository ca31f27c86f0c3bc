//! Collector Replay
//!
//! Drives a buffered collector from a synthetic sample source on a timer and
//! drains it periodically, the way a consumer sits behind a real sensor.

mod replay;
mod settings;
mod source;

pub use replay::{run_replay, ReplayError, ReplaySummary};
pub use settings::{ReplayConfig, SensorKind};
pub use source::{RawSample, SyntheticSource};

use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(level: &str, json: bool) -> Result<(), ReplayError> {
    let level = Level::from_str(level).unwrap_or(Level::INFO);

    let result = if json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| ReplayError::Logging(e.to_string()))
}
