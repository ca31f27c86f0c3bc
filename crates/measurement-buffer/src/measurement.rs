//! Measurement Record Contract

use crate::BufferError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Accuracy reported by the sensor alongside each sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SensorAccuracy {
    Unreliable,
    Low,
    Medium,
    High,
}

impl SensorAccuracy {
    /// Map a platform accuracy code (0..=3) to an accuracy level.
    ///
    /// Any other code, such as -1 for "no contact", has no accuracy.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SensorAccuracy::Unreliable),
            1 => Some(SensorAccuracy::Low),
            2 => Some(SensorAccuracy::Medium),
            3 => Some(SensorAccuracy::High),
            _ => None,
        }
    }

    /// Platform code for this accuracy level
    pub fn code(self) -> i32 {
        match self {
            SensorAccuracy::Unreliable => 0,
            SensorAccuracy::Low => 1,
            SensorAccuracy::Medium => 2,
            SensorAccuracy::High => 3,
        }
    }
}

/// A reusable record holding one sensor measurement.
///
/// Records are recycled by the buffer, so anything handed to a caller that
/// must not observe later mutation is a copy made with [`Measurement::copy_from`]
/// or `clone`.
pub trait Measurement: Default + Clone + Debug + Send + 'static {
    /// Minimum number of raw values a sample must carry
    const VALUE_COUNT: usize;

    /// Overwrite every field from a raw sample
    fn populate(
        &mut self,
        values: &[f32],
        timestamp_ns: i64,
        accuracy: Option<SensorAccuracy>,
    ) -> Result<(), BufferError>;

    /// Timestamp in nanoseconds
    fn timestamp_ns(&self) -> i64;

    /// Accuracy at the time of the sample
    fn accuracy(&self) -> Option<SensorAccuracy>;

    /// Duplicate `other` field by field into `self`
    fn copy_from(&mut self, other: &Self) {
        self.clone_from(other);
    }
}

/// Reject samples shorter than `expected`
pub(crate) fn require_values(values: &[f32], expected: usize) -> Result<(), BufferError> {
    if values.len() < expected {
        Err(BufferError::ShortSample {
            expected,
            actual: values.len(),
        })
    } else {
        Ok(())
    }
}

/// Read three values starting at `offset`, if the sample carries them
pub(crate) fn optional_triple(values: &[f32], offset: usize) -> Option<[f32; 3]> {
    match values.get(offset..offset + 3) {
        Some(&[x, y, z]) => Some([x, y, z]),
        _ => None,
    }
}
