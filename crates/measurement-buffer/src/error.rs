//! Buffer Error Types

use object_pool::PoolError;
use thiserror::Error;

/// Errors raised by the measurement buffer and its configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BufferError {
    /// Capacity must be greater than zero
    #[error("Invalid buffer capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// Raw sample carries fewer values than the measurement needs
    #[error("Raw sample too short: expected at least {expected} values, got {actual}")]
    ShortSample { expected: usize, actual: usize },

    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backing pool could not be created
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

impl From<::config::ConfigError> for BufferError {
    fn from(err: ::config::ConfigError) -> Self {
        BufferError::Config(err.to_string())
    }
}
