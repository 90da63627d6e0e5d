// src/acquisition/mod.rs
//! Continuous acquisition from a wrapping device buffer
//!
//! Data flows device → [`RingCursorTracker`] (which slots are new) → device
//! read → [`ChannelRetentionBuffer`] per channel → [`SampleExporter`] on drain.
//! [`AcquisitionSession`] wires these together around a worker thread
//! controlled through [`PauseStopController`].

pub mod control;
pub mod cursor;
pub mod export;
pub mod retention;
pub mod session;
pub mod worker;

pub use control::{Checkpoint, Pausable, PauseStopController, RunState, Stoppable};
pub use cursor::{available_samples, plan_reads, ReadPlan, RingCursorTracker, SampleRange, WrapPolicy};
pub use export::{export, ExportedSamples, SampleExporter};
pub use retention::{ChannelRetentionBuffer, RetentionStore};
pub use session::{AcquisitionSession, WORKER_THREAD_NAME};
pub use worker::{
    AcquisitionMetrics, AcquisitionWorker, DeviceGuard, MetricsSnapshot, WorkerEvent, WorkerState,
};
