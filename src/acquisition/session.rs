// src/acquisition/session.rs
//! Acquisition session: device setup, worker thread ownership, consumer access
//!
//! A session is opened against one instrument. Opening configures every
//! enabled channel, checks that the instrument honored the requested buffer
//! capacity, waits for the input offset to settle, and prepares a worker.
//! [`AcquisitionSession::start`] moves the worker onto its own thread; the
//! session keeps the controller side: pause/resume/stop, metrics, lifecycle
//! events, and access to the retained samples.
//!
//! Dropping a session stops and joins the worker. The device is closed when
//! the worker ends, or immediately if setup fails.

use crate::acquisition::control::{Pausable, PauseStopController, Stoppable};
use crate::acquisition::cursor::RingCursorTracker;
use crate::acquisition::export::{ExportedSamples, SampleExporter};
use crate::acquisition::retention::RetentionStore;
use crate::acquisition::worker::{
    AcquisitionMetrics, AcquisitionWorker, DeviceGuard, MetricsSnapshot, WorkerEvent, WorkerState,
};
use crate::config::SystemConfig;
use crate::error::{AcqError, AcqErrorBuilder, AcqResult, IntoAcqError};
use crate::hal::{ChannelId, DeviceError, DeviceFactory, DeviceInfo, ScopeDevice};
use crossbeam::channel::{unbounded, Receiver};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Name given to the worker thread
pub const WORKER_THREAD_NAME: &str = "scope-acquisition";

/// Owner of one instrument and the worker polling it
pub struct AcquisitionSession<D: ScopeDevice + 'static> {
    device_info: DeviceInfo,
    channels: Vec<ChannelId>,
    sample_rate_hz: u32,
    store: Arc<RetentionStore>,
    exporter: SampleExporter,
    control: PauseStopController,
    metrics: Arc<AcquisitionMetrics>,
    events: Receiver<WorkerEvent>,
    pending: Option<AcquisitionWorker<D>>,
    handle: Option<JoinHandle<AcqResult<MetricsSnapshot>>>,
}

impl AcquisitionSession<Box<dyn ScopeDevice>> {
    /// Open the device described by `config.hal`
    pub fn from_config(config: &SystemConfig) -> AcqResult<Self> {
        let device = DeviceFactory::create(&config.hal)?;
        Self::open(device, config)
    }
}

impl<D: ScopeDevice + 'static> AcquisitionSession<D> {
    /// Configure `device` and prepare a worker; nothing is acquired until `start`
    pub fn open(device: D, config: &SystemConfig) -> AcqResult<Self> {
        // Dropping the guard on any early return closes the device
        let mut guard = DeviceGuard::new(device);

        config.validate_consistency().map_err(|errors| {
            errors
                .iter()
                .fold(AcqErrorBuilder::new("session", "validate"), |builder, violation| {
                    builder.chain(violation)
                })
                .info("violations", errors.len())
                .configuration(&errors.join("; "))
        })?;

        let device_info = guard.device().device_info();
        let acq = &config.acquisition;

        for channel in config.channel_configs() {
            guard
                .device_mut()
                .configure_channel(&channel)
                .map_err(|e| AcqError::device(device_info.device_type.clone(), e, "configure_channel"))?;
            debug!(
                channel = channel.id,
                voltage_range_v = channel.voltage_range_v,
                attenuation = channel.attenuation,
                "channel configured"
            );
        }

        let actual = guard.device().buffer_capacity();
        if actual != acq.buffer_capacity {
            error!(requested = acq.buffer_capacity, actual, "device did not honor buffer capacity");
            return Err(AcqError::device(
                device_info.device_type.clone(),
                DeviceError::CapacityMismatch { requested: acq.buffer_capacity, actual },
                "configure_channel",
            ));
        }

        let settle = acq.settle_time();
        if !settle.is_zero() {
            debug!(settle_ms = acq.settle_time_ms, "waiting for input offset to settle");
            thread::sleep(settle);
        }

        let channels = config.channels.enabled.clone();
        let horizon = acq.retention_horizon();
        let store = Arc::new(RetentionStore::new(&channels, horizon));
        let control = PauseStopController::new();
        let metrics = Arc::new(AcquisitionMetrics::new());
        let (events_tx, events_rx) = unbounded();

        let worker = AcquisitionWorker::new(
            guard,
            device_info.device_type.clone(),
            channels.clone(),
            RingCursorTracker::new(acq.buffer_capacity, acq.start_index, acq.wrap_policy),
            store.clone(),
            control.clone(),
            metrics.clone(),
            events_tx,
        );

        info!(
            device = %device_info.name,
            device_type = %device_info.device_type,
            channels = ?channels,
            sample_rate_hz = acq.sample_rate_hz,
            capacity = acq.buffer_capacity,
            horizon,
            "acquisition session opened"
        );

        Ok(Self {
            device_info,
            channels,
            sample_rate_hz: acq.sample_rate_hz,
            store,
            exporter: SampleExporter::new(acq.sample_rate_hz as f64),
            control,
            metrics,
            events: events_rx,
            pending: Some(worker),
            handle: None,
        })
    }

    /// Spawn the worker thread
    pub fn start(&mut self) -> AcqResult<()> {
        let worker = self.pending.take().ok_or_else(|| {
            AcqErrorBuilder::new("session", "start").worker("acquisition already started")
        })?;

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run())
            .acq_err("thread", "spawn")?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Request termination and wait for the worker to finish
    ///
    /// Returns the worker's final metrics, or the error that ended it.
    pub fn stop_and_join(&mut self) -> AcqResult<MetricsSnapshot> {
        self.control.stop();

        if let Some(worker) = self.pending.take() {
            drop(worker);
            self.metrics.set_state(WorkerState::Stopped);
            return Ok(self.metrics.snapshot());
        }

        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(AcqErrorBuilder::new("session", "join").worker("acquisition thread panicked")),
            },
            None => Ok(self.metrics.snapshot()),
        }
    }

    /// Whether the worker has ended, by stop request or by failure
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => self.pending.is_none(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.metrics.state()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Lifecycle events published by the worker
    pub fn events(&self) -> Receiver<WorkerEvent> {
        self.events.clone()
    }

    /// Controller clone for pausing or stopping from another thread
    pub fn controller(&self) -> PauseStopController {
        self.control.clone()
    }

    /// Take the retained samples of every channel with their time axis
    pub fn drain_all(&self) -> BTreeMap<ChannelId, ExportedSamples> {
        self.exporter.export_all(self.store.drain_all())
    }

    pub fn drain(&self, channel: ChannelId) -> Option<ExportedSamples> {
        self.store
            .drain(channel)
            .map(|values| self.exporter.export(channel, values))
    }

    /// Retained sample values without clearing them
    pub fn data_y(&self) -> BTreeMap<ChannelId, Vec<f64>> {
        self.store.snapshot_all()
    }

    pub fn clear_data(&self) {
        self.store.clear();
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(self.exporter.sample_period())
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn retention_horizon(&self) -> usize {
        self.store.horizon()
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }
}

impl<D: ScopeDevice + 'static> Pausable for AcquisitionSession<D> {
    fn pause(&self) {
        self.control.pause();
    }

    fn resume(&self) {
        self.control.resume();
    }

    fn is_paused(&self) -> bool {
        self.control.is_paused()
    }
}

impl<D: ScopeDevice + 'static> Stoppable for AcquisitionSession<D> {
    fn stop(&self) {
        self.control.stop();
    }

    fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }
}

impl<D: ScopeDevice + 'static> Drop for AcquisitionSession<D> {
    fn drop(&mut self) {
        if self.pending.is_none() && self.handle.is_none() {
            return;
        }
        if let Err(e) = self.stop_and_join() {
            warn!(error = %e, "acquisition worker ended with an error");
        }
    }
}
