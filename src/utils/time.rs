// src/utils/time.rs
//! Clock sources for the simulated instrument and sample timing helpers

use crate::config::constants::timing::NANOSECONDS_PER_SECOND;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Time provider trait for dependency injection and testing
pub trait TimeProvider: Send + Sync {
    fn now_nanos(&self) -> u64;
    fn now_micros(&self) -> u64 {
        self.now_nanos() / 1000
    }
}

/// Wall clock time since the Unix epoch
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_nanos(&self) -> u64 {
        current_timestamp_nanos()
    }
}

/// Monotonic time since the provider was created
pub struct MonotonicTimeProvider {
    origin: Instant,
}

impl MonotonicTimeProvider {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MonotonicTimeProvider {
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Mock time provider for deterministic testing
///
/// Clones share the same clock so a test can keep one copy and hand the other
/// to the component under test.
#[derive(Clone)]
pub struct MockTimeProvider {
    current_time: Arc<AtomicU64>,
}

impl MockTimeProvider {
    pub fn new(initial_time_nanos: u64) -> Self {
        Self {
            current_time: Arc::new(AtomicU64::new(initial_time_nanos)),
        }
    }

    pub fn advance_by(&self, nanos: u64) {
        self.current_time.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn set_time(&self, nanos: u64) {
        self.current_time.store(nanos, Ordering::Relaxed);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_nanos(&self) -> u64 {
        self.current_time.load(Ordering::Relaxed)
    }
}

pub fn current_timestamp_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Sample period in nanoseconds, zero for a zero rate
pub fn calculate_sample_period_nanos(sample_rate_hz: u32) -> u64 {
    if sample_rate_hz == 0 {
        0
    } else {
        NANOSECONDS_PER_SECOND / sample_rate_hz as u64
    }
}

/// Number of whole samples produced at `sample_rate_hz` within `elapsed_nanos`
pub fn samples_elapsed(elapsed_nanos: u64, sample_rate_hz: u32) -> u64 {
    ((elapsed_nanos as u128 * sample_rate_hz as u128) / NANOSECONDS_PER_SECOND as u128) as u64
}
