//! Shared Producer Handle
//!
//! Lets a hardware source deliver samples from its own callback context while
//! the consumer queries the same collector.

use crate::{BufferStats, BufferedCollector, DropReason, Measurement, SampleOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Clears the processing latch on every exit path, unwinding included
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cloneable handle to a [`BufferedCollector`]
pub struct SharedCollector<M: Measurement> {
    inner: Arc<Mutex<BufferedCollector<M>>>,
    processing: Arc<AtomicBool>,
    skip_when_processing: bool,
}

impl<M: Measurement> Clone for SharedCollector<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            processing: Arc::clone(&self.processing),
            skip_when_processing: self.skip_when_processing,
        }
    }
}

impl<M: Measurement> SharedCollector<M> {
    /// Wrap a collector, taking the reentrancy policy from its configuration
    pub fn new(collector: BufferedCollector<M>) -> Self {
        let skip_when_processing = collector.config().skip_when_processing;
        Self {
            inner: Arc::new(Mutex::new(collector)),
            processing: Arc::new(AtomicBool::new(false)),
            skip_when_processing,
        }
    }

    /// Feed one raw sample.
    ///
    /// With `skip_when_processing`, a sample arriving while another is still
    /// being handled (from another thread, or re-entered from a listener) is
    /// dropped instead of waiting. Without it, such a re-entrant call from a
    /// listener deadlocks.
    pub fn on_sample(
        &self,
        values: &[f32],
        sensor_timestamp_ns: i64,
        accuracy_code: i32,
    ) -> SampleOutcome {
        if !self.skip_when_processing {
            return self.lock().on_sample(values, sensor_timestamp_ns, accuracy_code);
        }

        if self.processing.swap(true, Ordering::Acquire) {
            debug!("Sample dropped: previous sample still processing");
            return SampleOutcome::Dropped(DropReason::Processing);
        }
        let _guard = ProcessingGuard(&self.processing);
        self.lock().on_sample(values, sensor_timestamp_ns, accuracy_code)
    }

    /// Whether a sample is being processed right now
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub fn on_accuracy_changed(&self, accuracy_code: i32) {
        self.lock().on_accuracy_changed(accuracy_code);
    }

    pub fn start(&self, start_timestamp_ns: Option<i64>) -> bool {
        self.lock().start(start_timestamp_ns)
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn get_measurements_before_timestamp(&self, timestamp_ns: i64) -> Vec<M> {
        self.lock().get_measurements_before_timestamp(timestamp_ns)
    }

    pub fn get_measurements_before_position(&self, position: usize) -> Vec<M> {
        self.lock().get_measurements_before_position(position)
    }

    pub fn usage(&self) -> f32 {
        self.lock().usage()
    }

    pub fn stats(&self) -> BufferStats {
        self.lock().stats()
    }

    /// Run `f` with exclusive access to the collector
    pub fn with<R>(&self, f: impl FnOnce(&mut BufferedCollector<M>) -> R) -> R {
        f(&mut self.lock())
    }

    // A panicking listener poisons the mutex; the collector state is
    // consistent at every listener call, so keep using it.
    fn lock(&self) -> MutexGuard<'_, BufferedCollector<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccelerometerMeasurement, CollectorConfig};
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;

    fn shared(config: CollectorConfig) -> SharedCollector<AccelerometerMeasurement> {
        let shared = SharedCollector::new(BufferedCollector::new(config).unwrap());
        assert!(shared.start(Some(0)));
        shared
    }

    #[test]
    fn test_nested_sample_skipped() {
        let collector = shared(CollectorConfig::lose_oldest(4));
        let nested = collector.clone();
        let nested_outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&nested_outcomes);

        collector.with(|c| {
            c.set_measurement_listener(move |_, _| {
                let outcome = nested.on_sample(&[0.0, 0.0, 0.0], 999, 3);
                sink.lock().unwrap().push(outcome);
            });
        });

        let outcome = collector.on_sample(&[1.0, 2.0, 3.0], 10, 3);
        assert_eq!(outcome, SampleOutcome::Accepted { position: 0 });
        assert_eq!(
            *nested_outcomes.lock().unwrap(),
            vec![SampleOutcome::Dropped(DropReason::Processing)]
        );
        assert_eq!(collector.stats().len, 1);
        assert!(!collector.is_processing());

        // Break the listener -> handle cycle
        collector.with(|c| c.clear_measurement_listener());
    }

    #[test]
    fn test_latch_released_after_listener_panic() {
        let collector = shared(CollectorConfig::lose_oldest(4));
        collector.with(|c| {
            c.set_measurement_listener(|m: &AccelerometerMeasurement, _| {
                if m.timestamp_ns == 1 {
                    panic!("listener failure");
                }
            });
        });

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            collector.on_sample(&[0.0, 0.0, 0.0], 1, 3)
        }));
        assert!(result.is_err());
        assert!(!collector.is_processing());

        // Collector keeps working after the failed sample
        let outcome = collector.on_sample(&[0.0, 0.0, 0.0], 2, 3);
        assert_eq!(outcome, SampleOutcome::Accepted { position: 1 });
        assert_eq!(collector.stats().processed, 2);
    }

    #[test]
    fn test_producer_and_consumer_threads() {
        let collector = shared(CollectorConfig {
            skip_when_processing: false,
            ..CollectorConfig::lose_oldest(16)
        });
        let producer = collector.clone();

        let handle = thread::spawn(move || {
            for t in 0..1_000i64 {
                producer.on_sample(&[0.0, 0.0, 9.81], t, 3);
            }
        });

        let mut drained = Vec::new();
        while !handle.is_finished() {
            drained.extend(collector.get_measurements_before_position(8));
        }
        handle.join().unwrap();
        drained.extend(collector.get_measurements_before_position(usize::MAX));

        // Whatever survived eviction comes out in order
        assert!(drained.windows(2).all(|w| w[0].timestamp_ns < w[1].timestamp_ns));
        let stats = collector.stats();
        assert_eq!(stats.len, 0);
        assert_eq!(stats.processed, 1_000);
    }

    #[test]
    fn test_skip_disabled_processes_sequential_samples() {
        let collector = shared(CollectorConfig {
            skip_when_processing: false,
            ..CollectorConfig::lose_oldest(2)
        });
        assert!(collector.on_sample(&[0.0, 0.0, 0.0], 1, 3).is_stored());
        assert!(collector.on_sample(&[0.0, 0.0, 0.0], 2, 3).is_stored());
        assert_eq!(collector.usage(), 1.0);
    }
}
