//! Time Sources

/// Supplies the "current time" used when `start` is called without a timestamp
pub trait TimeSource: Send + Sync {
    /// Monotonic time in nanoseconds
    fn now_nanos(&self) -> i64;
}

/// The clock sensor hardware stamps samples with.
///
/// Reads `CLOCK_BOOTTIME` on Linux (keeps counting through suspend, like
/// sensor event timestamps) and `CLOCK_MONOTONIC` on other Unix targets.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

#[cfg(target_os = "linux")]
const SENSOR_CLOCK: libc::clockid_t = libc::CLOCK_BOOTTIME;

#[cfg(all(unix, not(target_os = "linux")))]
const SENSOR_CLOCK: libc::clockid_t = libc::CLOCK_MONOTONIC;

#[cfg(unix)]
impl TimeSource for MonotonicClock {
    fn now_nanos(&self) -> i64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call
        let ret = unsafe { libc::clock_gettime(SENSOR_CLOCK, &mut ts) };
        if ret != 0 {
            return 0;
        }
        (ts.tv_sec as i64)
            .saturating_mul(1_000_000_000)
            .saturating_add(ts.tv_nsec as i64)
    }
}

#[cfg(not(unix))]
impl TimeSource for MonotonicClock {
    fn now_nanos(&self) -> i64 {
        use std::sync::OnceLock;
        use std::time::Instant;

        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let elapsed = EPOCH.get_or_init(Instant::now).elapsed();
        i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX)
    }
}
