//! Producer / Consumer Replay Loop

use crate::{ReplayConfig, SensorKind, SyntheticSource};
use measurement_buffer::{
    AccelerometerMeasurement, AttitudeMeasurement, BufferError, BufferedCollector,
    GravityMeasurement, GyroscopeMeasurement, MagnetometerMeasurement, Measurement,
    SampleOutcome, SharedCollector,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop a replay
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but holds unusable values
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Collector could not be built
    #[error("Collector error: {0}")]
    Buffer(#[from] BufferError),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),

    /// Producer task failed
    #[error("Producer task failed: {0}")]
    Producer(#[from] tokio::task::JoinError),
}

/// Counts gathered over one replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Samples emitted by the source
    pub produced: u64,
    /// Samples stored without eviction
    pub accepted: u64,
    /// Samples stored by evicting the oldest measurement
    pub overwritten: u64,
    /// Samples dropped (not running, reentrant, malformed)
    pub dropped: u64,
    /// Overflow events under the stop policy
    pub stopped: u64,
    /// Buffer-filled notifications
    pub buffer_filled: u64,
    /// Measurements handed to the consumer
    pub drained: u64,
}

#[derive(Debug, Default)]
struct ProducerReport {
    produced: u64,
    accepted: u64,
    overwritten: u64,
    dropped: u64,
    stopped: u64,
}

/// Run a replay for the configured sensor kind
pub async fn run_replay(config: &ReplayConfig) -> Result<ReplaySummary, ReplayError> {
    config.validate()?;
    match config.sensor {
        SensorKind::Accelerometer => replay::<AccelerometerMeasurement>(config).await,
        SensorKind::Gyroscope => replay::<GyroscopeMeasurement>(config).await,
        SensorKind::Magnetometer => replay::<MagnetometerMeasurement>(config).await,
        SensorKind::Gravity => replay::<GravityMeasurement>(config).await,
        SensorKind::Attitude => replay::<AttitudeMeasurement>(config).await,
    }
}

async fn replay<M>(config: &ReplayConfig) -> Result<ReplaySummary, ReplayError>
where
    M: Measurement + Serialize,
{
    let collector = SharedCollector::new(BufferedCollector::<M>::new(config.collector.clone())?);

    let filled = Arc::new(AtomicU64::new(0));
    let filled_count = Arc::clone(&filled);
    collector.with(|c| {
        c.set_buffer_filled_listener(move || {
            filled_count.fetch_add(1, Ordering::Relaxed);
        });
        c.set_accuracy_changed_listener(|accuracy| {
            info!("Sensor accuracy now {:?}", accuracy);
        });
    });

    collector.on_accuracy_changed(3);
    collector.start(Some(0));

    let producer = spawn_producer(collector.clone(), config);

    let mut drain = tokio::time::interval(Duration::from_millis(config.drain_interval_ms));
    let mut drained = 0u64;
    while !producer.is_finished() {
        drain.tick().await;
        drained += drain_settled(&collector);
    }

    let report = producer.await?;
    drained += collector.get_measurements_before_position(usize::MAX).len() as u64;
    collector.stop();

    let summary = ReplaySummary {
        produced: report.produced,
        accepted: report.accepted,
        overwritten: report.overwritten,
        dropped: report.dropped,
        stopped: report.stopped,
        buffer_filled: filled.load(Ordering::Relaxed),
        drained,
    };
    info!("Replay summary: {:?}", summary);
    Ok(summary)
}

fn spawn_producer<M: Measurement>(
    collector: SharedCollector<M>,
    config: &ReplayConfig,
) -> tokio::task::JoinHandle<ProducerReport> {
    let total = config.total_samples();
    let period_ns = config.sample_period_ns();
    let restart_on_stop = config.collector.stop_when_filled_buffer;
    let mut source = SyntheticSource::new(config.sensor, period_ns);

    tokio::spawn(async move {
        let period = Duration::from_nanos(period_ns.max(1).unsigned_abs());
        let mut ticker = tokio::time::interval(period);
        let mut report = ProducerReport::default();

        for _ in 0..total {
            ticker.tick().await;
            let sample = source.next_sample();
            report.produced += 1;

            match collector.on_sample(sample.values(), sample.timestamp_ns, sample.accuracy) {
                SampleOutcome::Accepted { .. } => report.accepted += 1,
                SampleOutcome::Overwritten { .. } => report.overwritten += 1,
                SampleOutcome::Dropped(reason) => {
                    debug!("Sample {} dropped: {:?}", sample.timestamp_ns, reason);
                    report.dropped += 1;
                }
                SampleOutcome::Stopped => {
                    warn!("Buffer full at t={} ns, restarting collector", sample.timestamp_ns);
                    report.stopped += 1;
                    if restart_on_stop {
                        collector.start(Some(sample.timestamp_ns));
                    }
                }
            }
        }

        report
    })
}

/// Hand every measurement older than the newest one to the consumer
fn drain_settled<M: Measurement + Serialize>(collector: &SharedCollector<M>) -> u64 {
    let stats = collector.stats();
    let Some(newest) = stats.most_recent_timestamp_ns else {
        return 0;
    };

    let batch = collector.get_measurements_before_timestamp(newest);
    if let Some(last) = batch.last() {
        match serde_json::to_string(last) {
            Ok(json) => debug!("Drained {} measurements, last: {}", batch.len(), json),
            Err(e) => warn!("Could not serialize measurement: {}", e),
        }
    }
    debug!("Buffer usage after drain: {:.2}", collector.usage());
    batch.len() as u64
}
