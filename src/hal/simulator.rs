// src/hal/simulator.rs
//! Simulated oscilloscope with a wrapping sample buffer
//!
//! Behaves like a scan-screen acquisition: once started, samples are written
//! into a fixed-size circular buffer per channel and the write cursor wraps at
//! the configured capacity. The cursor advances either from a clock
//! ([`SimulatorClock::Realtime`]) or only when a test calls
//! [`SimulatorHandle::advance`] ([`SimulatorClock::Manual`]).

use crate::config::constants::hal::*;
use crate::hal::{
    ChannelConfig, ChannelId, DeviceError, DeviceInfo, DeviceState, DeviceType, ScopeDevice,
};
use crate::utils::time::{samples_elapsed, MonotonicTimeProvider, TimeProvider};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;

/// Simulator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    pub channel_count: usize,
    /// Largest ring buffer the simulated hardware honors; larger requests are clamped
    pub max_buffer_capacity: usize,
    /// State polls spent in Prefilling/Armed after `start` before reporting Running
    pub prefill_polls: u32,
    pub signal: SignalShape,
    /// Uniform noise as a fraction of the signal amplitude
    pub noise_level: f64,
    pub clock: SimulatorClock,
    pub seed: u64,
}

/// Generated waveform
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalShape {
    /// Each sample holds its own absolute index, handy for gap detection
    Counter,
    Sine { frequency_hz: f64, amplitude_v: f64 },
}

/// What drives the write cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorClock {
    Realtime,
    Manual,
}

/// Operation that should fail until the fault is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedFault {
    StatePoll,
    WriteCursor,
    Read,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            channel_count: 2,
            max_buffer_capacity: SIMULATOR_MAX_BUFFER_CAPACITY,
            prefill_polls: SIMULATOR_DEFAULT_PREFILL_POLLS,
            signal: SignalShape::Sine {
                frequency_hz: SIMULATOR_DEFAULT_SIGNAL_FREQUENCY_HZ,
                amplitude_v: 1.0,
            },
            noise_level: SIMULATOR_DEFAULT_NOISE_LEVEL,
            clock: SimulatorClock::Realtime,
            seed: 0,
        }
    }
}

impl SimulatorConfig {
    /// Deterministic configuration for tests: counter signal, manual clock
    pub fn manual() -> Self {
        Self {
            prefill_polls: 0,
            signal: SignalShape::Counter,
            clock: SimulatorClock::Manual,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.channel_count == 0 {
            return Err("Simulator channel count must be greater than 0".to_string());
        }
        if self.max_buffer_capacity < 2 {
            return Err("Simulator buffer capacity must be at least 2".to_string());
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            return Err("Simulator noise level must be between 0.0 and 1.0".to_string());
        }
        if let SignalShape::Sine { frequency_hz, .. } = self.signal {
            if frequency_hz <= 0.0 {
                return Err("Simulator signal frequency must be positive".to_string());
            }
        }
        Ok(())
    }
}

struct SimState {
    capacity: usize,
    sample_rate_hz: u32,
    channels: BTreeMap<ChannelId, ChannelConfig>,
    buffers: BTreeMap<ChannelId, Vec<f64>>,
    write_cursor: usize,
    total_written: u64,
    started_at_nanos: Option<u64>,
    state_polls: u32,
    closed: bool,
    fault: Option<SimulatedFault>,
    read_calls: u64,
    rng: StdRng,
}

impl SimState {
    fn check_open(&self) -> Result<(), DeviceError> {
        if self.closed {
            Err(DeviceError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_fault(&self, fault: SimulatedFault, operation: &str) -> Result<(), DeviceError> {
        if self.fault == Some(fault) {
            Err(DeviceError::Io {
                operation: operation.to_string(),
                reason: "injected fault".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Produce `count` samples on every configured channel
    fn write_samples(&mut self, signal: &SignalShape, noise_level: f64, count: u64) {
        if self.capacity == 0 || count == 0 {
            return;
        }

        // Only the last `capacity` samples survive, skip straight past the rest
        let capacity = self.capacity as u64;
        if count > capacity {
            let skipped = count - capacity;
            self.write_cursor = ((self.write_cursor as u64 + skipped) % capacity) as usize;
            self.total_written += skipped;
        }

        for _ in 0..count.min(capacity) {
            let index = self.total_written;
            let slot = self.write_cursor;
            let ids: Vec<ChannelId> = self.buffers.keys().copied().collect();
            for id in ids {
                let value = self.sample_value(signal, noise_level, id, index);
                if let Some(buffer) = self.buffers.get_mut(&id) {
                    buffer[slot] = value;
                }
            }
            self.write_cursor = (slot + 1) % self.capacity;
            self.total_written += 1;
        }
    }

    fn sample_value(&mut self, signal: &SignalShape, noise_level: f64, channel: ChannelId, index: u64) -> f64 {
        match *signal {
            SignalShape::Counter => index as f64,
            SignalShape::Sine { frequency_hz, amplitude_v } => {
                let t = index as f64 / self.sample_rate_hz.max(1) as f64;
                let phase = channel as f64 * PI / 2.0;
                let noise = if noise_level > 0.0 {
                    self.rng.gen_range(-1.0..1.0) * noise_level * amplitude_v
                } else {
                    0.0
                };
                amplitude_v * (2.0 * PI * frequency_hz * t + phase).sin() + noise
            }
        }
    }
}

/// Simulated oscilloscope implementing [`ScopeDevice`]
pub struct SimulatedScope {
    config: SimulatorConfig,
    state: Arc<Mutex<SimState>>,
    time_provider: Arc<dyn TimeProvider>,
}

/// Test-side control over a [`SimulatedScope`] that has been moved elsewhere
#[derive(Clone)]
pub struct SimulatorHandle {
    config: SimulatorConfig,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedScope {
    pub fn new(config: SimulatorConfig) -> Result<Self, DeviceError> {
        Self::with_time_provider(config, Arc::new(MonotonicTimeProvider::new()))
    }

    pub fn with_time_provider(
        config: SimulatorConfig,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self, DeviceError> {
        config.validate().map_err(|reason| DeviceError::Io {
            operation: "open".to_string(),
            reason,
        })?;

        let state = SimState {
            capacity: 0,
            sample_rate_hz: 0,
            channels: BTreeMap::new(),
            buffers: BTreeMap::new(),
            write_cursor: 0,
            total_written: 0,
            started_at_nanos: None,
            state_polls: 0,
            closed: false,
            fault: None,
            read_calls: 0,
            rng: StdRng::seed_from_u64(config.seed),
        };

        Ok(Self {
            config,
            state: Arc::new(Mutex::new(state)),
            time_provider,
        })
    }

    /// Handle for driving and inspecting the simulator from another thread
    pub fn handle(&self) -> SimulatorHandle {
        SimulatorHandle {
            config: self.config.clone(),
            state: self.state.clone(),
        }
    }

    /// Catch the buffer up with the clock in realtime mode
    fn sync_clock(&self, state: &mut SimState) {
        if self.config.clock != SimulatorClock::Realtime {
            return;
        }
        let Some(started_at) = state.started_at_nanos else {
            return;
        };

        let elapsed = self.time_provider.now_nanos().saturating_sub(started_at);
        let target = samples_elapsed(elapsed, state.sample_rate_hz);
        if target > state.total_written {
            let due = target - state.total_written;
            state.write_samples(&self.config.signal, self.config.noise_level, due);
        }
    }
}

impl ScopeDevice for SimulatedScope {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Scope Simulator".to_string(),
            serial_number: format!("SIM-{:04}", self.config.seed),
            device_type: DeviceType::Simulator,
            channel_count: self.config.channel_count,
            max_buffer_capacity: self.config.max_buffer_capacity,
        }
    }

    fn configure_channel(&mut self, config: &ChannelConfig) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        state.check_open()?;

        if config.id as usize >= self.config.channel_count {
            return Err(DeviceError::InvalidChannel(config.id));
        }

        let capacity = config.buffer_capacity.min(self.config.max_buffer_capacity);
        if capacity != state.capacity {
            state.capacity = capacity;
            state.write_cursor = 0;
            for buffer in state.buffers.values_mut() {
                buffer.clear();
                buffer.resize(capacity, 0.0);
            }
        }

        state.sample_rate_hz = config.sample_rate_hz;
        state.buffers.insert(config.id, vec![0.0; capacity]);
        state.channels.insert(config.id, config.clone());

        debug!(channel = config.id, requested = config.buffer_capacity, capacity, "simulated channel configured");
        Ok(())
    }

    fn buffer_capacity(&self) -> usize {
        self.state.lock().capacity
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        state.check_open()?;

        if state.channels.is_empty() {
            return Err(DeviceError::Io {
                operation: "start".to_string(),
                reason: "no channel configured".to_string(),
            });
        }

        state.started_at_nanos = Some(self.time_provider.now_nanos());
        state.state_polls = 0;
        Ok(())
    }

    fn get_state(&mut self) -> Result<DeviceState, DeviceError> {
        let mut state = self.state.lock();
        state.check_open()?;
        state.check_fault(SimulatedFault::StatePoll, "get_state")?;

        if state.started_at_nanos.is_none() {
            return Ok(DeviceState::Configuring);
        }

        self.sync_clock(&mut state);

        if state.state_polls < self.config.prefill_polls {
            state.state_polls += 1;
            return Ok(if state.state_polls == self.config.prefill_polls {
                DeviceState::Armed
            } else {
                DeviceState::Prefilling
            });
        }

        Ok(DeviceState::Running)
    }

    fn get_write_cursor(&mut self) -> Result<usize, DeviceError> {
        let mut state = self.state.lock();
        state.check_open()?;
        state.check_fault(SimulatedFault::WriteCursor, "get_write_cursor")?;
        self.sync_clock(&mut state);
        Ok(state.write_cursor)
    }

    fn read_samples(&mut self, channel: ChannelId, start: usize, count: usize) -> Result<Vec<f64>, DeviceError> {
        let mut state = self.state.lock();
        state.check_open()?;
        state.check_fault(SimulatedFault::Read, "read_samples")?;

        let capacity = state.capacity;
        if start >= capacity || start + count > capacity {
            return Err(DeviceError::RangeOutOfBounds { start, count, capacity });
        }

        state.read_calls += 1;
        let buffer = state
            .buffers
            .get(&channel)
            .ok_or(DeviceError::ChannelNotConfigured(channel))?;
        Ok(buffer[start..start + count].to_vec())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if !state.closed {
            debug!("simulated device closed");
        }
        state.closed = true;
        Ok(())
    }
}

impl SimulatorHandle {
    /// Produce `count` samples; ignored until the device has been started
    pub fn advance(&self, count: u64) {
        let mut state = self.state.lock();
        if state.started_at_nanos.is_some() && !state.closed {
            state.write_samples(&self.config.signal, self.config.noise_level, count);
        }
    }

    /// Make one operation fail until cleared with `None`
    pub fn set_fault(&self, fault: Option<SimulatedFault>) {
        self.state.lock().fault = fault;
    }

    pub fn total_written(&self) -> u64 {
        self.state.lock().total_written
    }

    pub fn write_cursor(&self) -> usize {
        self.state.lock().write_cursor
    }

    pub fn read_calls(&self) -> u64 {
        self.state.lock().read_calls
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started_at_nanos.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
