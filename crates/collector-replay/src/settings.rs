//! Replay Configuration

use crate::ReplayError;
use config::{Config, Environment, File};
use measurement_buffer::CollectorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which measurement shape the replay collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Gravity,
    Attitude,
}

/// Replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Sensor to simulate
    pub sensor: SensorKind,
    /// Producer rate in Hz (default: 200)
    pub sample_rate_hz: f64,
    /// How often the consumer drains the buffer (milliseconds)
    pub drain_interval_ms: u64,
    /// How long the producer runs (seconds)
    pub duration_secs: u64,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Buffer settings
    pub collector: CollectorConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            sensor: SensorKind::Accelerometer,
            sample_rate_hz: 200.0,
            drain_interval_ms: 100,
            duration_secs: 5,
            log_level: "info".to_string(),
            json_logs: false,
            collector: CollectorConfig::default(),
        }
    }
}

impl ReplayConfig {
    /// Load from an optional file, overridden by `REPLAY_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g. `REPLAY_COLLECTOR__CAPACITY=200`.
    pub fn load(path: Option<&Path>) -> Result<Self, ReplayError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: Self = builder
            .add_source(
                Environment::with_prefix("REPLAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be expressed in the types alone
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if self.sample_period_ns() < 1 {
            return Err(ReplayError::InvalidConfig(format!(
                "sample_rate_hz {} gives a sample period under one nanosecond",
                self.sample_rate_hz
            )));
        }
        if self.drain_interval_ms == 0 {
            return Err(ReplayError::InvalidConfig(
                "drain_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.collector.validate()?;
        Ok(())
    }

    /// Number of samples the producer emits
    pub fn total_samples(&self) -> u64 {
        (self.sample_rate_hz * self.duration_secs as f64).round() as u64
    }

    /// Time between samples in nanoseconds
    pub fn sample_period_ns(&self) -> i64 {
        (1e9 / self.sample_rate_hz).round() as i64
    }
}
