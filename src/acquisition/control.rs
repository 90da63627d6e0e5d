// src/acquisition/control.rs
//! Cooperative pause/resume/stop signaling between a controller and a worker

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::sync::Arc;

/// Requested run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

/// Something that can be paused and resumed
pub trait Pausable {
    /// Request a pause; honored before the next polling iteration
    fn pause(&self);

    /// Wake a paused worker
    fn resume(&self);

    fn is_paused(&self) -> bool;
}

/// Something that can be stopped for good
pub trait Stoppable {
    /// Request permanent termination
    fn stop(&self);

    fn is_stopped(&self) -> bool;
}

/// Outcome of [`PauseStopController::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    /// Keep polling; `resumed` is set when the worker just woke from a pause
    Proceed { resumed: bool },
    Stop,
}

struct ControlInner {
    state: Mutex<RunState>,
    wake: Condvar,
}

/// Shared pause/stop flag with a condition variable for the paused wait
///
/// Clones refer to the same state, so the controller keeps one and the worker
/// another. `Stopped` is terminal: `pause` and `resume` have no effect on it.
#[derive(Clone)]
pub struct PauseStopController {
    inner: Arc<ControlInner>,
}

impl PauseStopController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ControlInner {
                state: Mutex::new(RunState::Running),
                wake: Condvar::new(),
            }),
        }
    }

    pub fn state(&self) -> RunState {
        *self.inner.state.lock()
    }

    /// Worker side: block while paused, then report whether to continue
    ///
    /// `on_pause` runs once, under the lock, when the worker is about to
    /// block. There is no timeout; only `resume` or `stop` wakes the worker.
    pub fn checkpoint<F: FnOnce()>(&self, on_pause: F) -> Checkpoint {
        let mut state = self.inner.state.lock();
        let mut resumed = false;

        if *state == RunState::Paused {
            on_pause();
            while *state == RunState::Paused {
                self.inner.wake.wait(&mut state);
            }
            resumed = true;
        }

        match *state {
            RunState::Stopped => Checkpoint::Stop,
            _ => Checkpoint::Proceed { resumed },
        }
    }
}

impl Default for PauseStopController {
    fn default() -> Self {
        Self::new()
    }
}

impl Pausable for PauseStopController {
    fn pause(&self) {
        let mut state = self.inner.state.lock();
        if *state == RunState::Running {
            *state = RunState::Paused;
        }
    }

    fn resume(&self) {
        let mut state = self.inner.state.lock();
        if *state == RunState::Paused {
            *state = RunState::Running;
            self.inner.wake.notify_all();
        }
    }

    fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }
}

impl Stoppable for PauseStopController {
    fn stop(&self) {
        let mut state = self.inner.state.lock();
        *state = RunState::Stopped;
        self.inner.wake.notify_all();
    }

    fn is_stopped(&self) -> bool {
        self.state() == RunState::Stopped
    }
}
