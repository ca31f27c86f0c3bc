//! Pool Error Types

use thiserror::Error;

/// Errors raised while building a pool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A pool must hold at least one record
    #[error("Pool capacity must be greater than zero")]
    ZeroCapacity,
}
