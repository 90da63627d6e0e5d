// src/utils/mod.rs
//! Common utility functions for scope acquisition

pub mod time;

pub use time::{
    calculate_sample_period_nanos,
    current_timestamp_nanos,
    samples_elapsed,
    MockTimeProvider,
    MonotonicTimeProvider,
    SystemTimeProvider,
    TimeProvider,
};
