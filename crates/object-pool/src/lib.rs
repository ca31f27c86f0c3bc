//! Fixed-Capacity Object Pool
//!
//! Pre-allocates a set of reusable records and hands them out by slot so the
//! hot path never touches the allocator.

mod error;
mod pool;

pub use error::PoolError;
pub use pool::{ObjectPool, Slot};
