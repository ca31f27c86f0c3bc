//! Synthetic Sample Source

use crate::SensorKind;
use std::f32::consts::TAU;

/// Largest raw sample any simulated sensor emits
const MAX_VALUES: usize = 6;

/// Accuracy code reported with every synthetic sample (high)
const ACCURACY_HIGH: i32 = 3;

/// One raw sample as a hardware source would deliver it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    values: [f32; MAX_VALUES],
    len: usize,
    pub timestamp_ns: i64,
    pub accuracy: i32,
}

impl RawSample {
    /// Raw values carried by this sample
    pub fn values(&self) -> &[f32] {
        &self.values[..self.len]
    }
}

/// Emits slowly varying, evenly spaced samples for one sensor kind
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    kind: SensorKind,
    period_ns: i64,
    step: i64,
}

impl SyntheticSource {
    /// Create a source emitting one sample every `period_ns`
    pub fn new(kind: SensorKind, period_ns: i64) -> Self {
        Self {
            kind,
            period_ns: period_ns.max(1),
            step: 0,
        }
    }

    /// Produce the next sample
    pub fn next_sample(&mut self) -> RawSample {
        let timestamp_ns = self.step * self.period_ns;
        // One full cycle per second of sensor time
        let phase = (timestamp_ns % 1_000_000_000) as f32 / 1e9 * TAU;
        let (s, c) = phase.sin_cos();
        self.step += 1;

        let mut values = [0.0f32; MAX_VALUES];
        let len = match self.kind {
            SensorKind::Accelerometer => {
                values[..3].copy_from_slice(&[0.2 * s, 0.2 * c, 9.81]);
                3
            }
            SensorKind::Gyroscope => {
                values.copy_from_slice(&[0.1 * c, 0.1 * s, 0.05, 0.001, -0.001, 0.0]);
                6
            }
            SensorKind::Magnetometer => {
                values[..3].copy_from_slice(&[22.0 * c, 22.0 * s, -40.0]);
                3
            }
            SensorKind::Gravity => {
                values[..3].copy_from_slice(&[0.5 * s, 0.5 * c, 9.79]);
                3
            }
            SensorKind::Attitude => {
                // Slow yaw rotation about z
                let (hs, hc) = (phase / 2.0).sin_cos();
                values[..5].copy_from_slice(&[0.0, 0.0, hs, hc, 0.1]);
                5
            }
        };

        RawSample {
            values,
            len,
            timestamp_ns,
            accuracy: ACCURACY_HIGH,
        }
    }
}
