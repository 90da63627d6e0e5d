// src/config/mod.rs
//! Acquisition configuration management

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::acquisition::WrapPolicy;
use crate::hal::simulator::SimulatorConfig;
use crate::hal::{AcquisitionMode, ChannelConfig, ChannelId, DeviceType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Complete system configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub acquisition: AcquisitionSettings,
    #[serde(default)]
    pub channels: ChannelSettings,
    #[serde(default)]
    pub hal: HalConfig,
}

/// Sampling and device buffer settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AcquisitionSettings {
    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: u32,

    /// Device ring buffer length requested from the instrument
    #[serde(default = "defaults::buffer_capacity")]
    pub buffer_capacity: usize,

    /// How many seconds of the most recent samples to retain per channel
    #[serde(default = "defaults::window_seconds")]
    pub window_seconds: f64,

    #[serde(default = "defaults::settle_time_ms")]
    pub settle_time_ms: u64,

    #[serde(default)]
    pub wrap_policy: WrapPolicy,

    /// Initial read cursor into the device buffer
    #[serde(default = "defaults::start_index")]
    pub start_index: usize,
}

/// Analog input channel settings shared by every enabled channel
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChannelSettings {
    #[serde(default = "defaults::enabled")]
    pub enabled: Vec<ChannelId>,

    #[serde(default = "defaults::voltage_range_v")]
    pub voltage_range_v: f64,

    #[serde(default = "defaults::probe_attenuation")]
    pub probe_attenuation: f64,

    #[serde(default)]
    pub mode: AcquisitionMode,
}

/// Instrument selection
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HalConfig {
    #[serde(default = "defaults::device_type")]
    pub device_type: DeviceType,

    pub simulator: Option<SimulatorConfig>,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use crate::hal::{ChannelId, DeviceType};

    pub fn sample_rate_hz() -> u32 { acquisition::DEFAULT_SAMPLE_RATE_HZ }
    pub fn buffer_capacity() -> usize { acquisition::DEFAULT_BUFFER_CAPACITY }
    pub fn window_seconds() -> f64 { acquisition::DEFAULT_WINDOW_SECONDS }
    pub fn settle_time_ms() -> u64 { acquisition::DEFAULT_SETTLE_TIME_MS }
    pub fn start_index() -> usize { acquisition::DEFAULT_START_INDEX }

    pub fn enabled() -> Vec<ChannelId> { channels::DEFAULT_ENABLED.to_vec() }
    pub fn voltage_range_v() -> f64 { channels::DEFAULT_VOLTAGE_RANGE_V }
    pub fn probe_attenuation() -> f64 { channels::DEFAULT_PROBE_ATTENUATION }

    pub fn device_type() -> DeviceType { DeviceType::Simulator }
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: defaults::sample_rate_hz(),
            buffer_capacity: defaults::buffer_capacity(),
            window_seconds: defaults::window_seconds(),
            settle_time_ms: defaults::settle_time_ms(),
            wrap_policy: WrapPolicy::default(),
            start_index: defaults::start_index(),
        }
    }
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            voltage_range_v: defaults::voltage_range_v(),
            probe_attenuation: defaults::probe_attenuation(),
            mode: AcquisitionMode::default(),
        }
    }
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            device_type: defaults::device_type(),
            simulator: Some(SimulatorConfig::default()),
        }
    }
}

impl AcquisitionSettings {
    /// Retention horizon `N = R × window`, truncated to whole samples
    pub fn retention_horizon(&self) -> usize {
        (self.sample_rate_hz as f64 * self.window_seconds).max(0.0) as usize
    }

    /// Duration of one sample
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sample_rate_hz as f64)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_millis(self.settle_time_ms)
    }
}

impl SystemConfig {
    /// Validate configuration consistency, collecting every violation
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let acq = &self.acquisition;
        let ch = &self.channels;

        if acq.sample_rate_hz < acquisition::MIN_SAMPLE_RATE_HZ
            || acq.sample_rate_hz > acquisition::MAX_SAMPLE_RATE_HZ
        {
            errors.push(format!(
                "Sample rate {} Hz outside [{}, {}]",
                acq.sample_rate_hz, acquisition::MIN_SAMPLE_RATE_HZ, acquisition::MAX_SAMPLE_RATE_HZ
            ));
        }

        if acq.buffer_capacity < acquisition::MIN_BUFFER_CAPACITY
            || acq.buffer_capacity > acquisition::MAX_BUFFER_CAPACITY
        {
            errors.push(format!(
                "Buffer capacity {} outside [{}, {}]",
                acq.buffer_capacity, acquisition::MIN_BUFFER_CAPACITY, acquisition::MAX_BUFFER_CAPACITY
            ));
        }

        if acq.start_index >= acq.buffer_capacity {
            errors.push(format!(
                "Start index {} must be below buffer capacity {}",
                acq.start_index, acq.buffer_capacity
            ));
        }

        if !acq.window_seconds.is_finite()
            || acq.window_seconds < 0.0
            || acq.window_seconds > acquisition::MAX_WINDOW_SECONDS
        {
            errors.push(format!(
                "Acquisition window {} s outside [0, {}]",
                acq.window_seconds, acquisition::MAX_WINDOW_SECONDS
            ));
        }

        if acq.retention_horizon() > acquisition::MAX_RETENTION_SAMPLES {
            errors.push(format!(
                "Retention of {} samples per channel ({} Hz over {} s) exceeds {}",
                acq.retention_horizon(), acq.sample_rate_hz, acq.window_seconds, acquisition::MAX_RETENTION_SAMPLES
            ));
        }

        if acq.settle_time_ms > acquisition::MAX_SETTLE_TIME_MS {
            errors.push(format!(
                "Settle time {} ms exceeds {} ms",
                acq.settle_time_ms, acquisition::MAX_SETTLE_TIME_MS
            ));
        }

        if ch.enabled.is_empty() {
            errors.push("At least one channel must be enabled".to_string());
        }

        let mut seen = HashSet::new();
        for id in &ch.enabled {
            if *id > channels::MAX_CHANNEL_ID {
                errors.push(format!("Channel {} exceeds maximum id {}", id, channels::MAX_CHANNEL_ID));
            }
            if !seen.insert(*id) {
                errors.push(format!("Channel {} enabled more than once", id));
            }
        }

        if !(channels::MIN_VOLTAGE_RANGE_V..=channels::MAX_VOLTAGE_RANGE_V).contains(&ch.voltage_range_v) {
            errors.push(format!(
                "Voltage range {} V outside [{}, {}]",
                ch.voltage_range_v, channels::MIN_VOLTAGE_RANGE_V, channels::MAX_VOLTAGE_RANGE_V
            ));
        }

        if !(channels::MIN_PROBE_ATTENUATION..=channels::MAX_PROBE_ATTENUATION).contains(&ch.probe_attenuation) {
            errors.push(format!(
                "Probe attenuation {} outside [{}, {}]",
                ch.probe_attenuation, channels::MIN_PROBE_ATTENUATION, channels::MAX_PROBE_ATTENUATION
            ));
        }

        if self.hal.device_type == DeviceType::Simulator {
            if let Some(sim) = &self.hal.simulator {
                if let Err(e) = sim.validate() {
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Per-channel device setup derived from the channel and acquisition settings
    pub fn channel_configs(&self) -> Vec<ChannelConfig> {
        self.channels
            .enabled
            .iter()
            .map(|&id| ChannelConfig {
                id,
                voltage_range_v: self.channels.voltage_range_v,
                attenuation: self.channels.probe_attenuation,
                sample_rate_hz: self.acquisition.sample_rate_hz,
                buffer_capacity: self.acquisition.buffer_capacity,
                mode: self.channels.mode,
            })
            .collect()
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            sample_rate_hz: self.acquisition.sample_rate_hz,
            buffer_capacity: self.acquisition.buffer_capacity,
            retention_horizon: self.acquisition.retention_horizon(),
            channel_count: self.channels.enabled.len(),
            device_type: self.hal.device_type.clone(),
            wrap_policy: self.acquisition.wrap_policy,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub sample_rate_hz: u32,
    pub buffer_capacity: usize,
    pub retention_horizon: usize,
    pub channel_count: usize,
    pub device_type: DeviceType,
    pub wrap_policy: WrapPolicy,
}
