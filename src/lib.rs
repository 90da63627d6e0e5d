//! Scope-Core: continuous sample acquisition from wrapping instrument buffers
//!
//! Oscilloscopes and logic analyzers in scan-screen mode write samples into a
//! fixed-size circular buffer and only report where they will write next.
//! This library runs a worker thread that follows that write cursor, copies
//! every new sample out for each enabled channel, and keeps a bounded window
//! of the most recent samples for a consumer to drain. It features:
//!
//! - Hardware abstraction layer with a deterministic simulator
//! - Wraparound-aware read planning with a selectable boundary policy
//! - Pause/resume/stop control of the acquisition thread
//! - Bounded per-channel retention with time-stamped export
//! - Layered TOML configuration with environment overrides
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scope_core::acquisition::AcquisitionSession;
//! use scope_core::config::SystemConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SystemConfig::default();
//!     let mut session = AcquisitionSession::from_config(&config)?;
//!     session.start()?;
//!
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//!     for (channel, samples) in session.drain_all() {
//!         println!("channel {}: {} samples", channel, samples.len());
//!     }
//!
//!     session.stop_and_join()?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod hal;
pub mod utils;

// Re-export commonly used types for convenience
pub use acquisition::{
    AcquisitionSession, ExportedSamples, Pausable, PauseStopController, RingCursorTracker,
    SampleExporter, Stoppable, WorkerEvent, WorkerState, WrapPolicy,
};

pub use config::{ConfigLoader, SystemConfig};

pub use error::{AcqError, AcqResult, ErrorContext};

pub use hal::{ChannelId, DeviceError, DeviceFactory, DeviceInfo, DeviceState, ScopeDevice};

pub use utils::time::{current_timestamp_nanos, TimeProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Continuous acquisition from wrapping instrument sample buffers".to_string(),
        features: vec![
            "Hardware abstraction layer".to_string(),
            "Wraparound read planning".to_string(),
            "Pausable acquisition worker".to_string(),
            "Bounded per-channel retention".to_string(),
            "Layered configuration management".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
