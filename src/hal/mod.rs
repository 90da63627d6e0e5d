// src/hal/mod.rs
//! Hardware Abstraction Layer for sampling instruments

pub mod traits;
pub mod types;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use traits::*;
pub use types::*;

use crate::config::HalConfig;
use crate::error::{AcqError, AcqErrorBuilder, AcqResult};
use simulator::{SimulatedScope, SimulatorConfig};

/// Builds instruments from configuration
pub struct DeviceFactory;

impl DeviceFactory {
    /// Open the device named by `config`
    ///
    /// Only the simulator ships with this crate. Hardware drivers implement
    /// [`ScopeDevice`] themselves and are handed to
    /// [`AcquisitionSession::open`](crate::acquisition::AcquisitionSession::open) directly.
    pub fn create(config: &HalConfig) -> AcqResult<Box<dyn ScopeDevice>> {
        match &config.device_type {
            DeviceType::Simulator => {
                let sim_config = config.simulator.clone().unwrap_or_default();
                Ok(Box::new(Self::create_simulator(sim_config)?))
            }
            other => Err(AcqErrorBuilder::new("hal", "create_device")
                .configuration(&format!("no built-in driver for device type {}", other))),
        }
    }

    pub fn create_simulator(config: SimulatorConfig) -> AcqResult<SimulatedScope> {
        SimulatedScope::new(config)
            .map_err(|e| AcqError::device(DeviceType::Simulator, e, "open"))
    }
}
