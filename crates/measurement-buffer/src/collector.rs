//! Bounded Measurement Buffer Implementation

use crate::{
    BufferError, CollectorConfig, Measurement, MonotonicClock, SensorAccuracy, TimeSource,
};
use object_pool::{ObjectPool, Slot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

type MeasurementListener<M> = Box<dyn FnMut(&M, usize) + Send>;
type BufferFilledListener = Box<dyn FnMut() + Send>;
type AccuracyListener = Box<dyn FnMut(Option<SensorAccuracy>) + Send>;

/// Why a sample was not stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// Collector was not started
    NotRunning,
    /// Another sample was still being processed
    Processing,
    /// Sample carried no values
    EmptySample,
    /// Sample could not populate a measurement
    Malformed,
}

/// What happened to a sample handed to [`BufferedCollector::on_sample`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleOutcome {
    /// Stored at `position`
    Accepted { position: usize },
    /// Buffer was full; the oldest measurement was evicted and the sample stored at `position`
    Overwritten { position: usize },
    /// Buffer was full under the stop policy; collector stopped and cleared
    Stopped,
    /// Sample was dropped without touching the buffer
    Dropped(DropReason),
}

impl SampleOutcome {
    /// Whether the sample ended up in the buffer
    pub fn is_stored(&self) -> bool {
        matches!(
            self,
            SampleOutcome::Accepted { .. } | SampleOutcome::Overwritten { .. }
        )
    }
}

/// Point-in-time statistics about a collector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    pub len: usize,
    pub capacity: usize,
    pub usage: f32,
    pub processed: u64,
    pub oldest_timestamp_ns: Option<i64>,
    pub most_recent_timestamp_ns: Option<i64>,
    pub running: bool,
}

/// Fixed-capacity, timestamp-ordered buffer of recycled measurements.
///
/// Records live in an [`ObjectPool`]; the buffer holds the slots of those in
/// use, oldest first. After every call settles, pool and buffer together
/// account for exactly `capacity` records.
pub struct BufferedCollector<M: Measurement> {
    config: CollectorConfig,
    pool: ObjectPool<M>,
    /// In-use slots, head is the oldest measurement
    buffer: VecDeque<Slot>,
    running: bool,
    processed: u64,
    most_recent_timestamp: Option<i64>,
    start_timestamp: i64,
    /// Latched on the first accepted sample when enabled
    start_offset: Option<i64>,
    accuracy: Option<SensorAccuracy>,
    time_source: Arc<dyn TimeSource>,
    measurement_listener: Option<MeasurementListener<M>>,
    buffer_filled_listener: Option<BufferFilledListener>,
    accuracy_listener: Option<AccuracyListener>,
}

impl<M: Measurement> BufferedCollector<M> {
    /// Create a stopped collector with an empty buffer and a full pool
    pub fn new(config: CollectorConfig) -> Result<Self, BufferError> {
        Self::with_time_source(config, Arc::new(MonotonicClock))
    }

    /// Create a collector that reads the current time from `time_source`
    pub fn with_time_source(
        config: CollectorConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, BufferError> {
        config.validate()?;
        let pool = ObjectPool::new(config.capacity)?;

        info!(
            "Creating buffered collector: capacity={}, stop_when_filled={}, start_offset={}",
            config.capacity, config.stop_when_filled_buffer, config.start_offset_enabled
        );

        Ok(Self {
            buffer: VecDeque::with_capacity(config.capacity),
            config,
            pool,
            running: false,
            processed: 0,
            most_recent_timestamp: None,
            start_timestamp: 0,
            start_offset: None,
            accuracy: None,
            time_source,
            measurement_listener: None,
            buffer_filled_listener: None,
            accuracy_listener: None,
        })
    }

    /// Begin accepting samples.
    ///
    /// Returns `false` without changing anything if already running. Buffer
    /// contents are left as they are; call [`stop`](Self::stop) first for a
    /// fresh run.
    pub fn start(&mut self, start_timestamp_ns: Option<i64>) -> bool {
        if self.running {
            debug!("Collector already running, start ignored");
            return false;
        }

        self.start_timestamp = start_timestamp_ns.unwrap_or_else(|| self.time_source.now_nanos());
        self.running = true;
        info!("Collector started at {} ns", self.start_timestamp);
        true
    }

    /// Stop accepting samples, recycle every buffered measurement and reset counters
    pub fn stop(&mut self) {
        let was_running = self.running;

        while let Some(slot) = self.buffer.pop_front() {
            self.pool.release(slot);
        }
        self.running = false;
        self.processed = 0;
        self.most_recent_timestamp = None;
        self.start_offset = None;

        if was_running {
            info!("Collector stopped");
        }
    }

    /// Feed one raw sample from the hardware source.
    ///
    /// `accuracy_code` uses the platform codes understood by
    /// [`SensorAccuracy::from_code`].
    pub fn on_sample(
        &mut self,
        values: &[f32],
        sensor_timestamp_ns: i64,
        accuracy_code: i32,
    ) -> SampleOutcome {
        if !self.running {
            trace!("Sample dropped: collector not running");
            return SampleOutcome::Dropped(DropReason::NotRunning);
        }
        if values.is_empty() {
            trace!("Sample dropped: no values");
            return SampleOutcome::Dropped(DropReason::EmptySample);
        }
        if values.len() < M::VALUE_COUNT {
            warn!(
                "Sample dropped: {} values, measurement needs {}",
                values.len(),
                M::VALUE_COUNT
            );
            return SampleOutcome::Dropped(DropReason::Malformed);
        }

        let timestamp = self.effective_timestamp(sensor_timestamp_ns);
        let accuracy = SensorAccuracy::from_code(accuracy_code);

        let (slot, overwritten) = match self.pool.acquire() {
            Some(slot) => (slot, false),
            None => {
                warn!("Buffer filled at capacity {}", self.config.capacity);
                if let Some(listener) = self.buffer_filled_listener.as_mut() {
                    listener();
                }

                if self.config.stop_when_filled_buffer {
                    self.stop();
                    return SampleOutcome::Stopped;
                }

                // Pool and buffer are never both empty while capacity > 0
                let Some(oldest) = self.buffer.pop_front() else {
                    return SampleOutcome::Dropped(DropReason::Malformed);
                };
                (oldest, true)
            }
        };

        if let Err(e) = self.pool.get_mut(&slot).populate(values, timestamp, accuracy) {
            warn!("Sample dropped: {}", e);
            self.pool.release(slot);
            return SampleOutcome::Dropped(DropReason::Malformed);
        }

        self.buffer.push_back(slot);
        self.processed = self.processed.wrapping_add(1);
        self.most_recent_timestamp = Some(timestamp);
        let position = self.buffer.len() - 1;

        trace!("Sample stored at position {} (t={} ns)", position, timestamp);

        if let (Some(listener), Some(slot)) =
            (self.measurement_listener.as_mut(), self.buffer.back())
        {
            listener(self.pool.get(slot), position);
        }

        if overwritten {
            SampleOutcome::Overwritten { position }
        } else {
            SampleOutcome::Accepted { position }
        }
    }

    /// Record an accuracy change reported by the sensor and forward it
    pub fn on_accuracy_changed(&mut self, accuracy_code: i32) {
        let accuracy = SensorAccuracy::from_code(accuracy_code);
        debug!("Sensor accuracy changed to {:?}", accuracy);
        self.accuracy = accuracy;
        if let Some(listener) = self.accuracy_listener.as_mut() {
            listener(accuracy);
        }
    }

    fn effective_timestamp(&mut self, sensor_timestamp_ns: i64) -> i64 {
        if self.config.start_offset_enabled && self.start_offset.is_none() {
            let offset = sensor_timestamp_ns.saturating_sub(self.start_timestamp);
            debug!("Start offset latched at {} ns", offset);
            self.start_offset = Some(offset);
        }
        sensor_timestamp_ns.saturating_add(self.start_offset.unwrap_or(0))
    }

    // --- Queries ---

    /// Remove every measurement older than `timestamp_ns` and return copies, oldest first
    pub fn get_measurements_before_timestamp(&mut self, timestamp_ns: i64) -> Vec<M> {
        let mut out = Vec::new();
        self.drain_before_timestamp_into(timestamp_ns, &mut out);
        out
    }

    /// Remove the first `position` measurements and return copies, oldest first
    pub fn get_measurements_before_position(&mut self, position: usize) -> Vec<M> {
        let mut out = Vec::new();
        self.drain_before_position_into(position, &mut out);
        out
    }

    /// Like [`get_measurements_before_timestamp`](Self::get_measurements_before_timestamp),
    /// appending to `out`. Returns the number of measurements moved.
    pub fn drain_before_timestamp_into(&mut self, timestamp_ns: i64, out: &mut Vec<M>) -> usize {
        let count = self.position_before_timestamp(timestamp_ns);
        self.drain_front_into(count, out)
    }

    /// Like [`get_measurements_before_position`](Self::get_measurements_before_position),
    /// appending to `out`. Returns the number of measurements moved.
    pub fn drain_before_position_into(&mut self, position: usize, out: &mut Vec<M>) -> usize {
        self.drain_front_into(position, out)
    }

    /// Number of buffered measurements with a timestamp strictly before `timestamp_ns`
    pub fn position_before_timestamp(&self, timestamp_ns: i64) -> usize {
        self.buffer
            .partition_point(|slot| self.pool.get(slot).timestamp_ns() < timestamp_ns)
    }

    fn drain_front_into(&mut self, count: usize, out: &mut Vec<M>) -> usize {
        let count = count.min(self.buffer.len());
        if count == 0 {
            return 0;
        }

        out.reserve(count);
        for slot in self.buffer.drain(..count) {
            let mut copy = M::default();
            copy.copy_from(self.pool.get(&slot));
            out.push(copy);
            self.pool.release(slot);
        }

        debug!("Drained {} measurements, {} remain", count, self.buffer.len());
        count
    }

    // --- Views ---

    /// Buffered measurements, oldest first, without removing them
    pub fn buffered_measurements(&self) -> impl Iterator<Item = &M> + '_ {
        let pool = &self.pool;
        self.buffer.iter().map(move |slot| pool.get(slot))
    }

    /// Measurement at `position`, 0 being the oldest
    pub fn get(&self, position: usize) -> Option<&M> {
        self.buffer.get(position).map(|slot| self.pool.get(slot))
    }

    /// Number of buffered measurements
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if no measurement is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if the next sample overflows
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.config.capacity
    }

    /// Maximum number of buffered measurements
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Records left in the pool
    pub fn available_in_pool(&self) -> usize {
        self.pool.available()
    }

    /// Fill ratio (0.0 to 1.0)
    pub fn usage(&self) -> f32 {
        self.buffer.len() as f32 / self.config.capacity as f32
    }

    /// Samples stored since the last stop
    pub fn number_of_processed_measurements(&self) -> u64 {
        self.processed
    }

    /// Timestamp of the newest stored sample since the last stop
    pub fn most_recent_timestamp(&self) -> Option<i64> {
        self.most_recent_timestamp
    }

    /// Timestamp at the head of the buffer
    pub fn oldest_timestamp_in_buffer(&self) -> Option<i64> {
        self.get(0).map(Measurement::timestamp_ns)
    }

    /// Reference timestamp given to (or taken by) the last start
    pub fn start_timestamp(&self) -> i64 {
        self.start_timestamp
    }

    /// Latched start offset, if any
    pub fn start_offset(&self) -> Option<i64> {
        self.start_offset
    }

    /// Last accuracy reported through [`on_accuracy_changed`](Self::on_accuracy_changed)
    pub fn accuracy(&self) -> Option<SensorAccuracy> {
        self.accuracy
    }

    /// Whether samples are being accepted
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Configuration in use
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Snapshot of the collector's counters
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            len: self.len(),
            capacity: self.capacity(),
            usage: self.usage(),
            processed: self.processed,
            oldest_timestamp_ns: self.oldest_timestamp_in_buffer(),
            most_recent_timestamp_ns: self.most_recent_timestamp,
            running: self.running,
        }
    }

    // --- Listeners ---

    /// Called with each stored measurement and its position
    pub fn set_measurement_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&M, usize) + Send + 'static,
    {
        self.measurement_listener = Some(Box::new(listener));
    }

    /// Called once per overflow, before the overflow policy runs
    pub fn set_buffer_filled_listener<F>(&mut self, listener: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.buffer_filled_listener = Some(Box::new(listener));
    }

    /// Called when the sensor reports a new accuracy
    pub fn set_accuracy_changed_listener<F>(&mut self, listener: F)
    where
        F: FnMut(Option<SensorAccuracy>) + Send + 'static,
    {
        self.accuracy_listener = Some(Box::new(listener));
    }

    pub fn clear_measurement_listener(&mut self) {
        self.measurement_listener = None;
    }

    pub fn clear_buffer_filled_listener(&mut self) {
        self.buffer_filled_listener = None;
    }

    pub fn clear_accuracy_changed_listener(&mut self) {
        self.accuracy_listener = None;
    }
}

impl<M: Measurement> fmt::Debug for BufferedCollector<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedCollector")
            .field("config", &self.config)
            .field("len", &self.buffer.len())
            .field("available", &self.pool.available())
            .field("running", &self.running)
            .field("processed", &self.processed)
            .field("start_offset", &self.start_offset)
            .finish_non_exhaustive()
    }
}
