//! Per-Sensor Measurement Shapes
//!
//! Each shape maps a raw sample's value array onto its fields. Unit and axis
//! conversion happen before samples reach the buffer.

use crate::measurement::{optional_triple, require_values};
use crate::{BufferError, Measurement, SensorAccuracy};
use serde::{Deserialize, Serialize};

/// Accelerometer sample (m/s²), with optional bias from uncalibrated sensors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelerometerMeasurement {
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    /// Estimated bias (bx, by, bz)
    pub bias: Option<[f32; 3]>,
    pub timestamp_ns: i64,
    pub accuracy: Option<SensorAccuracy>,
}

impl Measurement for AccelerometerMeasurement {
    const VALUE_COUNT: usize = 3;

    fn populate(
        &mut self,
        values: &[f32],
        timestamp_ns: i64,
        accuracy: Option<SensorAccuracy>,
    ) -> Result<(), BufferError> {
        require_values(values, Self::VALUE_COUNT)?;
        self.ax = values[0];
        self.ay = values[1];
        self.az = values[2];
        self.bias = optional_triple(values, 3);
        self.timestamp_ns = timestamp_ns;
        self.accuracy = accuracy;
        Ok(())
    }

    fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    fn accuracy(&self) -> Option<SensorAccuracy> {
        self.accuracy
    }
}

/// Gyroscope sample (rad/s), with optional drift from uncalibrated sensors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GyroscopeMeasurement {
    pub wx: f32,
    pub wy: f32,
    pub wz: f32,
    /// Estimated drift (bx, by, bz)
    pub drift: Option<[f32; 3]>,
    pub timestamp_ns: i64,
    pub accuracy: Option<SensorAccuracy>,
}

impl Measurement for GyroscopeMeasurement {
    const VALUE_COUNT: usize = 3;

    fn populate(
        &mut self,
        values: &[f32],
        timestamp_ns: i64,
        accuracy: Option<SensorAccuracy>,
    ) -> Result<(), BufferError> {
        require_values(values, Self::VALUE_COUNT)?;
        self.wx = values[0];
        self.wy = values[1];
        self.wz = values[2];
        self.drift = optional_triple(values, 3);
        self.timestamp_ns = timestamp_ns;
        self.accuracy = accuracy;
        Ok(())
    }

    fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    fn accuracy(&self) -> Option<SensorAccuracy> {
        self.accuracy
    }
}

/// Magnetometer sample (µT), with optional hard-iron estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagnetometerMeasurement {
    pub bx: f32,
    pub by: f32,
    pub bz: f32,
    /// Hard-iron offset (hx, hy, hz)
    pub hard_iron: Option<[f32; 3]>,
    pub timestamp_ns: i64,
    pub accuracy: Option<SensorAccuracy>,
}

impl Measurement for MagnetometerMeasurement {
    const VALUE_COUNT: usize = 3;

    fn populate(
        &mut self,
        values: &[f32],
        timestamp_ns: i64,
        accuracy: Option<SensorAccuracy>,
    ) -> Result<(), BufferError> {
        require_values(values, Self::VALUE_COUNT)?;
        self.bx = values[0];
        self.by = values[1];
        self.bz = values[2];
        self.hard_iron = optional_triple(values, 3);
        self.timestamp_ns = timestamp_ns;
        self.accuracy = accuracy;
        Ok(())
    }

    fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    fn accuracy(&self) -> Option<SensorAccuracy> {
        self.accuracy
    }
}

/// Gravity sample (m/s²)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GravityMeasurement {
    pub gx: f32,
    pub gy: f32,
    pub gz: f32,
    pub timestamp_ns: i64,
    pub accuracy: Option<SensorAccuracy>,
}

impl Measurement for GravityMeasurement {
    const VALUE_COUNT: usize = 3;

    fn populate(
        &mut self,
        values: &[f32],
        timestamp_ns: i64,
        accuracy: Option<SensorAccuracy>,
    ) -> Result<(), BufferError> {
        require_values(values, Self::VALUE_COUNT)?;
        self.gx = values[0];
        self.gy = values[1];
        self.gz = values[2];
        self.timestamp_ns = timestamp_ns;
        self.accuracy = accuracy;
        Ok(())
    }

    fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    fn accuracy(&self) -> Option<SensorAccuracy> {
        self.accuracy
    }
}

/// Attitude sample as a unit quaternion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttitudeMeasurement {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    /// Estimated heading accuracy (radians)
    pub heading_accuracy: Option<f32>,
    pub timestamp_ns: i64,
    pub accuracy: Option<SensorAccuracy>,
}

impl Default for AttitudeMeasurement {
    fn default() -> Self {
        // Identity rotation
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
            heading_accuracy: None,
            timestamp_ns: 0,
            accuracy: None,
        }
    }
}

impl Measurement for AttitudeMeasurement {
    const VALUE_COUNT: usize = 4;

    fn populate(
        &mut self,
        values: &[f32],
        timestamp_ns: i64,
        accuracy: Option<SensorAccuracy>,
    ) -> Result<(), BufferError> {
        require_values(values, Self::VALUE_COUNT)?;
        self.x = values[0];
        self.y = values[1];
        self.z = values[2];
        self.w = values[3];
        self.heading_accuracy = values.get(4).copied();
        self.timestamp_ns = timestamp_ns;
        self.accuracy = accuracy;
        Ok(())
    }

    fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    fn accuracy(&self) -> Option<SensorAccuracy> {
        self.accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerometer_populate() {
        let mut m = AccelerometerMeasurement::default();
        m.populate(&[0.1, 0.2, 9.8], 1_000, Some(SensorAccuracy::High))
            .unwrap();

        assert_eq!(m.ax, 0.1);
        assert_eq!(m.az, 9.8);
        assert_eq!(m.bias, None);
        assert_eq!(m.timestamp_ns(), 1_000);
        assert_eq!(m.accuracy(), Some(SensorAccuracy::High));
    }

    #[test]
    fn test_uncalibrated_bias_read_when_present() {
        let mut m = GyroscopeMeasurement::default();
        m.populate(&[1.0, 2.0, 3.0, 0.01, 0.02, 0.03], 5, None).unwrap();
        assert_eq!(m.drift, Some([0.01, 0.02, 0.03]));
    }

    #[test]
    fn test_repopulate_clears_optional_fields() {
        let mut m = MagnetometerMeasurement::default();
        m.populate(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1, Some(SensorAccuracy::Low))
            .unwrap();
        assert!(m.hard_iron.is_some());

        // Recycled record must not leak the previous sample's fields
        m.populate(&[7.0, 8.0, 9.0], 2, None).unwrap();
        assert_eq!(m.hard_iron, None);
        assert_eq!(m.accuracy(), None);
        assert_eq!(m.bx, 7.0);
    }

    #[test]
    fn test_short_sample_rejected() {
        let mut m = GravityMeasurement::default();
        let err = m.populate(&[9.8, 0.0], 1, None).unwrap_err();
        assert_eq!(err, BufferError::ShortSample { expected: 3, actual: 2 });
    }

    #[test]
    fn test_attitude_heading_accuracy() {
        let mut m = AttitudeMeasurement::default();
        assert_eq!(m.w, 1.0);

        m.populate(&[0.0, 0.0, 0.7071, 0.7071, 0.05], 10, None).unwrap();
        assert_eq!(m.heading_accuracy, Some(0.05));

        m.populate(&[0.0, 0.0, 0.0, 1.0], 11, None).unwrap();
        assert_eq!(m.heading_accuracy, None);

        assert!(m.populate(&[0.0, 0.0, 0.0], 12, None).is_err());
    }

    #[test]
    fn test_copy_is_independent() {
        let mut original = AccelerometerMeasurement::default();
        original.populate(&[1.0, 2.0, 3.0], 42, None).unwrap();

        let mut copy = AccelerometerMeasurement::default();
        copy.copy_from(&original);
        assert_eq!(copy, original);

        copy.ax = 100.0;
        assert_eq!(original.ax, 1.0);
    }
}
