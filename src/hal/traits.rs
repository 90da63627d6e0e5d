// src/hal/traits.rs
//! Core HAL trait for oscilloscope device abstraction

use crate::hal::types::{ChannelConfig, ChannelId, DeviceError, DeviceInfo, DeviceState};

/// Capability surface the acquisition worker needs from an instrument
///
/// Status queries take `&mut self` because real drivers refresh a cached
/// status block on every poll.
pub trait ScopeDevice: Send {
    /// Get device information
    fn device_info(&self) -> DeviceInfo;

    /// Enable and configure one analog input channel
    ///
    /// A driver may clamp the requested buffer capacity to what the hardware
    /// supports; callers compare [`ScopeDevice::buffer_capacity`] afterwards.
    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), DeviceError>;

    /// Ring buffer length actually in effect
    fn buffer_capacity(&self) -> usize;

    /// Begin filling the ring buffer
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Poll the acquisition state
    fn get_state(&mut self) -> Result<DeviceState, DeviceError>;

    /// Index of the next slot the instrument will write, in `[0, capacity)`
    fn get_write_cursor(&mut self) -> Result<usize, DeviceError>;

    /// Copy `count` samples of `channel` starting at `start`
    fn read_samples(&mut self, channel: ChannelId, start: usize, count: usize) -> Result<Vec<f64>, DeviceError>;

    /// Release the instrument; further calls fail with [`DeviceError::Closed`]
    fn close(&mut self) -> Result<(), DeviceError>;
}

impl<D: ScopeDevice + ?Sized> ScopeDevice for Box<D> {
    fn device_info(&self) -> DeviceInfo {
        (**self).device_info()
    }

    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), DeviceError> {
        (**self).configure_channel(config)
    }

    fn buffer_capacity(&self) -> usize {
        (**self).buffer_capacity()
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        (**self).start()
    }

    fn get_state(&mut self) -> Result<DeviceState, DeviceError> {
        (**self).get_state()
    }

    fn get_write_cursor(&mut self) -> Result<usize, DeviceError> {
        (**self).get_write_cursor()
    }

    fn read_samples(&mut self, channel: ChannelId, start: usize, count: usize) -> Result<Vec<f64>, DeviceError> {
        (**self).read_samples(channel, start, count)
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        (**self).close()
    }
}
