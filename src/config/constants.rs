// src/config/constants.rs
//! System-wide configuration constants

/// Acquisition timing and buffer constants
pub mod acquisition {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100_000;
    pub const MIN_SAMPLE_RATE_HZ: u32 = 1;
    pub const MAX_SAMPLE_RATE_HZ: u32 = 100_000_000;

    /// Device-side ring buffer length in samples
    pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;
    pub const MIN_BUFFER_CAPACITY: usize = 2;
    pub const MAX_BUFFER_CAPACITY: usize = 1 << 24;

    pub const DEFAULT_WINDOW_SECONDS: f64 = 1.0;
    pub const MAX_WINDOW_SECONDS: f64 = 3600.0;

    /// Upper bound on `sample_rate_hz × window_seconds`, per channel
    pub const MAX_RETENTION_SAMPLES: usize = 1 << 25;

    /// Retention buffers reserve at most this many slots up front and grow on append
    pub const RETENTION_PREALLOCATION_LIMIT: usize = 1 << 16;

    /// Input offset needs about two seconds to stabilize after channel setup
    pub const DEFAULT_SETTLE_TIME_MS: u64 = 2000;
    pub const MAX_SETTLE_TIME_MS: u64 = 60_000;

    pub const DEFAULT_START_INDEX: usize = 0;
}

/// Analog input channel constants
pub mod channels {
    pub const DEFAULT_ENABLED: [u32; 2] = [0, 1];
    pub const MAX_CHANNEL_ID: u32 = 15;

    pub const DEFAULT_VOLTAGE_RANGE_V: f64 = 5.0;
    pub const MIN_VOLTAGE_RANGE_V: f64 = 0.001;
    pub const MAX_VOLTAGE_RANGE_V: f64 = 100.0;

    /// x10 probe
    pub const DEFAULT_PROBE_ATTENUATION: f64 = 10.0;
    pub const MIN_PROBE_ATTENUATION: f64 = 0.001;
    pub const MAX_PROBE_ATTENUATION: f64 = 1000.0;
}

/// Hardware abstraction layer constants
pub mod hal {
    /// Largest ring buffer the simulated instrument honors
    pub const SIMULATOR_MAX_BUFFER_CAPACITY: usize = 32_768;
    pub const SIMULATOR_DEFAULT_PREFILL_POLLS: u32 = 3;
    pub const SIMULATOR_DEFAULT_SIGNAL_FREQUENCY_HZ: f64 = 1000.0;
    pub const SIMULATOR_DEFAULT_NOISE_LEVEL: f64 = 0.0;
}

/// Timing conversions
pub mod timing {
    pub const NANOSECONDS_PER_SECOND: u64 = 1_000_000_000;
    pub const MILLISECONDS_PER_SECOND: u64 = 1_000;
}

/// Configuration file locations
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/scope/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/scope";
    pub const LOCAL_CONFIG_FILE: &str = "scope.toml";
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";

    /// Prefix for environment overrides, e.g. `SCOPE_ACQUISITION__SAMPLE_RATE_HZ`
    pub const ENV_PREFIX: &str = "SCOPE_";
    pub const ENV_SECTION_SEPARATOR: &str = "__";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity_within_limits() {
        assert!(acquisition::DEFAULT_BUFFER_CAPACITY >= acquisition::MIN_BUFFER_CAPACITY);
        assert!(acquisition::DEFAULT_BUFFER_CAPACITY <= hal::SIMULATOR_MAX_BUFFER_CAPACITY);
    }

    #[test]
    fn test_default_channels_valid() {
        assert!(channels::DEFAULT_ENABLED.iter().all(|&id| id <= channels::MAX_CHANNEL_ID));
    }

    #[test]
    fn test_default_window_within_retention_limit() {
        let horizon = acquisition::DEFAULT_SAMPLE_RATE_HZ as f64 * acquisition::DEFAULT_WINDOW_SECONDS;
        assert!(horizon as usize <= acquisition::MAX_RETENTION_SAMPLES);
        assert!(acquisition::RETENTION_PREALLOCATION_LIMIT <= acquisition::MAX_RETENTION_SAMPLES);
    }
}
