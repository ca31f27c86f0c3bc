//! Property-based tests for the buffered collector.
//!
//! Run with: cargo test -p measurement-buffer --test buffer_properties

use measurement_buffer::{
    BufferedCollector, CollectorConfig, GyroscopeMeasurement, Measurement, SampleOutcome,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Non-decreasing timestamps, as delivered by a serialized hardware source.
fn arb_timestamps(max_len: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0i64..1_000, 0..max_len).prop_map(|steps| {
        let mut t = 0i64;
        steps
            .into_iter()
            .map(|step| {
                t += step;
                t
            })
            .collect()
    })
}

/// Either a sample or a query against the buffer.
#[derive(Debug, Clone)]
enum Op {
    Sample([f32; 3]),
    BeforeTimestamp(i64),
    BeforePosition(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::array::uniform3(-50.0f32..50.0).prop_map(Op::Sample),
        1 => (0i64..20_000).prop_map(Op::BeforeTimestamp),
        1 => (0usize..40).prop_map(Op::BeforePosition),
    ]
}

fn started(config: CollectorConfig) -> BufferedCollector<GyroscopeMeasurement> {
    let mut collector = BufferedCollector::new(config).unwrap();
    collector.start(Some(0));
    collector
}

fn buffered_timestamps(collector: &BufferedCollector<GyroscopeMeasurement>) -> Vec<i64> {
    collector
        .buffered_measurements()
        .map(Measurement::timestamp_ns)
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn records_are_always_accounted_for(
        capacity in 1usize..32,
        stop_when_full in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 0..200),
    ) {
        let config = CollectorConfig {
            stop_when_filled_buffer: stop_when_full,
            ..CollectorConfig::lose_oldest(capacity)
        };
        let mut collector = started(config);
        let mut t = 0i64;

        for op in ops {
            match op {
                Op::Sample(values) => {
                    t += 10;
                    if collector.on_sample(&values, t, 3) == SampleOutcome::Stopped {
                        collector.start(Some(t));
                    }
                }
                Op::BeforeTimestamp(ts) => {
                    collector.get_measurements_before_timestamp(ts);
                }
                Op::BeforePosition(p) => {
                    collector.get_measurements_before_position(p);
                }
            }

            prop_assert!(collector.len() <= capacity);
            prop_assert_eq!(collector.len() + collector.available_in_pool(), capacity);
            prop_assert!((0.0..=1.0).contains(&collector.usage()));
        }
    }

    #[test]
    fn buffer_stays_timestamp_ordered(
        capacity in 1usize..16,
        timestamps in arb_timestamps(64),
    ) {
        let mut collector = started(CollectorConfig::lose_oldest(capacity));
        for t in &timestamps {
            collector.on_sample(&[0.0, 0.0, 0.0], *t, 3);
        }

        let buffered = buffered_timestamps(&collector);
        prop_assert!(buffered.windows(2).all(|w| w[0] <= w[1]));

        // Lose-oldest keeps exactly the newest `capacity` samples
        let keep = timestamps.len().min(capacity);
        prop_assert_eq!(&buffered[..], &timestamps[timestamps.len() - keep..]);
    }

    #[test]
    fn drained_copies_match_buffered_records(
        values in prop::collection::vec(prop::array::uniform3(-50.0f32..50.0), 1..20),
        cut in 0i64..300,
    ) {
        let mut collector = started(CollectorConfig::lose_oldest(32));
        for (i, v) in values.iter().enumerate() {
            collector.on_sample(v, (i as i64) * 10, 2);
        }

        let before: Vec<GyroscopeMeasurement> =
            collector.buffered_measurements().cloned().collect();
        let expected_count = collector.position_before_timestamp(cut);
        let mut drained = collector.get_measurements_before_timestamp(cut);

        prop_assert_eq!(drained.len(), expected_count);
        prop_assert_eq!(&drained[..], &before[..expected_count]);
        prop_assert!(drained.iter().all(|m| m.timestamp_ns < cut));
        prop_assert!(collector.buffered_measurements().all(|m| m.timestamp_ns >= cut));

        // Mutating the copies never reaches the buffer
        for m in &mut drained {
            m.wx = f32::NAN;
        }
        let remaining: Vec<GyroscopeMeasurement> =
            collector.buffered_measurements().cloned().collect();
        prop_assert_eq!(&remaining[..], &before[expected_count..]);
    }

    #[test]
    fn stop_twice_equals_stop_once(
        capacity in 1usize..16,
        samples in 0usize..40,
    ) {
        let mut collector = started(CollectorConfig::lose_oldest(capacity));
        for t in 0..samples {
            collector.on_sample(&[1.0, 1.0, 1.0], t as i64, 3);
        }

        collector.stop();
        let once = collector.stats();
        collector.stop();
        let twice = collector.stats();

        prop_assert_eq!(once, twice);
        prop_assert_eq!(once.len, 0);
        prop_assert_eq!(once.processed, 0);
        prop_assert_eq!(collector.available_in_pool(), capacity);
    }

    #[test]
    fn start_offset_is_latched_once(
        start in 0i64..1_000_000,
        first_delay in 0i64..1_000_000,
        later in prop::collection::vec(0i64..1_000_000, 1..10),
    ) {
        let config = CollectorConfig {
            start_offset_enabled: true,
            ..CollectorConfig::lose_oldest(16)
        };
        let mut collector = started(config);
        collector.stop();
        collector.start(Some(start));

        let h1 = start + first_delay;
        collector.on_sample(&[0.0, 0.0, 0.0], h1, 3);
        let offset = h1 - start;
        prop_assert_eq!(collector.start_offset(), Some(offset));

        let mut h = h1;
        for step in later {
            h += step;
            collector.on_sample(&[0.0, 0.0, 0.0], h, 3);
            prop_assert_eq!(collector.most_recent_timestamp(), Some(h + offset));
            prop_assert_eq!(collector.start_offset(), Some(offset));
        }
    }
}
