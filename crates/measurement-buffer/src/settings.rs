//! Collector Configuration

use crate::BufferError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default buffer capacity (50 samples = 250 ms at 200 Hz)
pub const DEFAULT_CAPACITY: usize = 50;

/// Buffered collector configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Maximum number of measurements held at once
    pub capacity: usize,
    /// Latch the first sample's delay from the start timestamp and add it to every timestamp
    pub start_offset_enabled: bool,
    /// Stop and clear on overflow instead of evicting the oldest measurement
    pub stop_when_filled_buffer: bool,
    /// Drop samples that arrive while another one is being processed.
    ///
    /// Only read by `SharedCollector`. `BufferedCollector::on_sample` ignores
    /// it, since `&mut self` already rules out a nested call.
    pub skip_when_processing: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            start_offset_enabled: false,
            stop_when_filled_buffer: false,
            skip_when_processing: true,
        }
    }
}

impl CollectorConfig {
    /// Keep the newest `capacity` measurements, evicting the oldest on overflow
    pub fn lose_oldest(capacity: usize) -> Self {
        Self {
            capacity,
            stop_when_filled_buffer: false,
            ..Default::default()
        }
    }

    /// Stop collecting and clear once `capacity` measurements are buffered
    pub fn stop_when_full(capacity: usize) -> Self {
        Self {
            capacity,
            stop_when_filled_buffer: true,
            ..Default::default()
        }
    }

    /// Check values that cannot be expressed in the types alone
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.capacity == 0 {
            return Err(BufferError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }

    /// Load from an optional file, overridden by `COLLECTOR_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, BufferError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config: Self = builder
            .add_source(Environment::with_prefix("COLLECTOR").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, BufferError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}
