//! Bounded Measurement Buffer
//!
//! Collects timestamped sensor samples from an asynchronous producer into a
//! fixed-capacity, recyclable, timestamp-ordered buffer backed by an object
//! pool, and answers point and range queries against its contents without
//! allocating on the hot path.

mod clock;
mod collector;
mod error;
mod measurement;
mod sensors;
mod settings;
mod shared;

pub use clock::{MonotonicClock, TimeSource};
pub use collector::{BufferStats, BufferedCollector, DropReason, SampleOutcome};
pub use error::BufferError;
pub use measurement::{Measurement, SensorAccuracy};
pub use sensors::{
    AccelerometerMeasurement, AttitudeMeasurement, GravityMeasurement, GyroscopeMeasurement,
    MagnetometerMeasurement,
};
pub use settings::{CollectorConfig, DEFAULT_CAPACITY};
pub use shared::SharedCollector;
