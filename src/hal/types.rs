// src/hal/types.rs
//! Core types for oscilloscope device abstraction

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Analog input channel index on the instrument
pub type ChannelId = u32;

/// Acquisition state reported by the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Configuring,
    Prefilling,
    Armed,
    Running,
    Other,
}

impl DeviceState {
    /// Acquisition has been requested but samples are not flowing yet
    pub fn awaiting_start(self) -> bool {
        matches!(self, DeviceState::Configuring | DeviceState::Prefilling | DeviceState::Armed)
    }
}

/// How the instrument fills its sample buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMode {
    /// Continuous circular writes, the mode the worker is built around
    #[default]
    ScanScreen,
    ScanShift,
    Record,
}

/// Per-channel setup sent to the instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: ChannelId,
    pub voltage_range_v: f64,
    pub attenuation: f64,
    pub sample_rate_hz: u32,
    pub buffer_capacity: usize,
    pub mode: AcquisitionMode,
}

/// Device information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub serial_number: String,
    pub device_type: DeviceType,
    pub channel_count: usize,
    pub max_buffer_capacity: usize,
}

/// Device connection types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Simulator,
    AnalogDiscovery,
    Unknown(String),
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Simulator => write!(f, "SIMULATOR"),
            DeviceType::AnalogDiscovery => write!(f, "ANALOG-DISCOVERY"),
            DeviceType::Unknown(name) => write!(f, "UNKNOWN-{}", name),
        }
    }
}

/// Errors reported by an instrument driver
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("requested buffer capacity {requested} not honored, device reports {actual}")]
    CapacityMismatch { requested: usize, actual: usize },

    #[error("channel {0} does not exist on this device")]
    InvalidChannel(ChannelId),

    #[error("channel {0} has not been configured")]
    ChannelNotConfigured(ChannelId),

    #[error("read of {count} samples at {start} exceeds buffer capacity {capacity}")]
    RangeOutOfBounds { start: usize, count: usize, capacity: usize },

    #[error("{operation} failed: {reason}")]
    Io { operation: String, reason: String },

    #[error("device is closed")]
    Closed,
}
