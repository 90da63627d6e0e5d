// src/acquisition/worker.rs
//! Polling loop that moves samples from the device ring buffer into retention
//!
//! Each iteration checks the pause/stop state, waits for the instrument to
//! report `Running`, reads everything written since the last poll, appends
//! the batch to every channel, and then advances the read cursor. Device
//! failures end the loop and are returned to whoever joins the thread.

use crate::acquisition::control::{Checkpoint, PauseStopController};
use crate::acquisition::cursor::{ReadPlan, RingCursorTracker};
use crate::acquisition::retention::RetentionStore;
use crate::error::{AcqError, AcqErrorBuilder, AcqResult};
use crate::hal::{ChannelId, DeviceError, DeviceType, ScopeDevice};
use crossbeam::channel::Sender;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, trace, warn};

/// Lifecycle of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Created,
    Running,
    Paused,
    Stopped,
}

impl WorkerState {
    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Created => 0,
            WorkerState::Running => 1,
            WorkerState::Paused => 2,
            WorkerState::Stopped => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Created,
            1 => WorkerState::Running,
            2 => WorkerState::Paused,
            _ => WorkerState::Stopped,
        }
    }
}

/// Lifecycle notifications published by the worker
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Started,
    Paused,
    Resumed,
    Stopped,
    Failed(String),
}

/// Counters updated by the worker and readable from any thread
#[derive(Debug)]
pub struct AcquisitionMetrics {
    state: AtomicU8,
    iterations: AtomicU64,
    not_ready_polls: AtomicU64,
    idle_polls: AtomicU64,
    batches: AtomicU64,
    wraps: AtomicU64,
    samples_per_channel: AtomicU64,
}

/// Point-in-time copy of [`AcquisitionMetrics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub state: WorkerState,
    pub iterations: u64,
    /// Polls where the device was still configuring, prefilling or armed
    pub not_ready_polls: u64,
    /// Polls where the write cursor had not moved
    pub idle_polls: u64,
    pub batches: u64,
    pub wraps: u64,
    /// Samples read per channel; duplicates from inclusive wraps are counted
    pub samples_per_channel: u64,
}

impl AcquisitionMetrics {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(WorkerState::Created.as_u8()),
            iterations: AtomicU64::new(0),
            not_ready_polls: AtomicU64::new(0),
            idle_polls: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            wraps: AtomicU64::new(0),
            samples_per_channel: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: WorkerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            state: self.state(),
            iterations: self.iterations.load(Ordering::Relaxed),
            not_ready_polls: self.not_ready_polls.load(Ordering::Relaxed),
            idle_polls: self.idle_polls.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            wraps: self.wraps.load(Ordering::Relaxed),
            samples_per_channel: self.samples_per_channel.load(Ordering::Relaxed),
        }
    }
}

impl Default for AcquisitionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the wrapped device when dropped
pub struct DeviceGuard<D: ScopeDevice> {
    device: D,
}

impl<D: ScopeDevice> DeviceGuard<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: ScopeDevice> Drop for DeviceGuard<D> {
    fn drop(&mut self) {
        match self.device.close() {
            Ok(()) => debug!("device closed"),
            Err(e) => warn!(error = %e, "device close failed"),
        }
    }
}

/// Everything the loop needs, moved into the worker thread on start
pub struct AcquisitionWorker<D: ScopeDevice> {
    device: DeviceGuard<D>,
    device_type: DeviceType,
    channels: Vec<ChannelId>,
    tracker: RingCursorTracker,
    store: Arc<RetentionStore>,
    control: PauseStopController,
    metrics: Arc<AcquisitionMetrics>,
    events: Sender<WorkerEvent>,
}

impl<D: ScopeDevice> AcquisitionWorker<D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: DeviceGuard<D>,
        device_type: DeviceType,
        channels: Vec<ChannelId>,
        tracker: RingCursorTracker,
        store: Arc<RetentionStore>,
        control: PauseStopController,
        metrics: Arc<AcquisitionMetrics>,
        events: Sender<WorkerEvent>,
    ) -> Self {
        Self {
            device,
            device_type,
            channels,
            tracker,
            store,
            control,
            metrics,
            events,
        }
    }

    /// Start the device and poll until stopped or a device call fails
    ///
    /// Consumes the worker; the device is closed when this returns.
    pub fn run(mut self) -> AcqResult<MetricsSnapshot> {
        let result = self.start_device().and_then(|()| self.poll_loop());
        self.metrics.set_state(WorkerState::Stopped);

        match &result {
            Ok(()) => {
                info!(read_index = self.tracker.read_index(), "acquisition worker stopped");
                self.publish(WorkerEvent::Stopped);
            }
            Err(e) => {
                error!(error = %e, "acquisition worker failed");
                self.publish(WorkerEvent::Failed(e.to_string()));
            }
        }

        result.map(|()| self.metrics.snapshot())
    }

    fn start_device(&mut self) -> AcqResult<()> {
        let device_type = self.device_type.clone();
        self.device
            .device_mut()
            .start()
            .map_err(|e| AcqError::device(device_type, e, "start"))?;

        self.metrics.set_state(WorkerState::Running);
        info!(
            thread = thread::current().name().unwrap_or("unnamed"),
            channels = ?self.channels,
            capacity = self.tracker.capacity(),
            policy = ?self.tracker.policy(),
            "acquisition worker started"
        );
        self.publish(WorkerEvent::Started);
        Ok(())
    }

    fn poll_loop(&mut self) -> AcqResult<()> {
        loop {
            let metrics = &self.metrics;
            let events = &self.events;
            let checkpoint = self.control.checkpoint(|| {
                metrics.set_state(WorkerState::Paused);
                debug!("acquisition paused");
                let _ = events.send(WorkerEvent::Paused);
            });

            match checkpoint {
                Checkpoint::Stop => return Ok(()),
                Checkpoint::Proceed { resumed: true } => {
                    self.metrics.set_state(WorkerState::Running);
                    debug!("acquisition resumed");
                    self.publish(WorkerEvent::Resumed);
                }
                Checkpoint::Proceed { resumed: false } => {}
            }

            self.poll_once()?;
        }
    }

    /// One iteration of steps 2 through 7
    fn poll_once(&mut self) -> AcqResult<()> {
        self.metrics.iterations.fetch_add(1, Ordering::Relaxed);

        let state = self.device_call("get_state", |d| d.get_state())?;
        if state.awaiting_start() {
            self.metrics.not_ready_polls.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let write_index = self.device_call("get_write_cursor", |d| d.get_write_cursor())?;
        let capacity = self.tracker.capacity();
        if write_index >= capacity {
            return Err(AcqErrorBuilder::new("worker", "get_write_cursor")
                .info("read_index", self.tracker.read_index())
                .info("device_type", &self.device_type)
                .mismatch("write cursor", format!("< {}", capacity), write_index));
        }

        let plan = self.tracker.plan(write_index);
        if plan.is_idle() {
            self.metrics.idle_polls.fetch_add(1, Ordering::Relaxed);
            thread::yield_now();
            return Ok(());
        }

        let batch = self.read_batch(&plan)?;
        self.store.append_batch(&batch);
        self.tracker.commit(write_index);

        if plan.is_wrapped() {
            self.metrics.wraps.fetch_add(1, Ordering::Relaxed);
            trace!(?plan, write_index, "wrapped read");
        }
        self.metrics.batches.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .samples_per_channel
            .fetch_add(plan.total_len() as u64, Ordering::Relaxed);
        Ok(())
    }

    fn read_batch(&mut self, plan: &ReadPlan) -> AcqResult<Vec<(ChannelId, Vec<f64>)>> {
        let total = plan.total_len();
        let mut batch = Vec::with_capacity(self.channels.len());

        for index in 0..self.channels.len() {
            let channel = self.channels[index];
            let mut samples = Vec::with_capacity(total);
            for range in plan.ranges() {
                let chunk = self.device_call("read_samples", |d| d.read_samples(channel, range.start, range.len))?;
                samples.extend(chunk);
            }
            batch.push((channel, samples));
        }

        Ok(batch)
    }

    fn device_call<T>(
        &mut self,
        operation: &str,
        call: impl FnOnce(&mut D) -> Result<T, DeviceError>,
    ) -> AcqResult<T> {
        call(self.device.device_mut()).map_err(|e| AcqError::device(self.device_type.clone(), e, operation))
    }

    fn publish(&self, event: WorkerEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}
