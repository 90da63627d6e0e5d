// src/acquisition/retention.rs
//! Bounded per-channel sample retention
//!
//! [`ChannelRetentionBuffer`] keeps the most recent `horizon` samples of one
//! channel and evicts from the front. [`RetentionStore`] groups the buffers of
//! every enabled channel behind one lock so a worker batch lands on all
//! channels at once and a consumer drain sees the same sample count on each.

use crate::config::constants::acquisition::RETENTION_PREALLOCATION_LIMIT;
use crate::hal::ChannelId;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

/// Sliding window over the most recent samples of one channel
#[derive(Debug, Clone)]
pub struct ChannelRetentionBuffer {
    samples: VecDeque<f64>,
    horizon: usize,
}

impl ChannelRetentionBuffer {
    pub fn new(horizon: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(horizon.min(RETENTION_PREALLOCATION_LIMIT)),
            horizon,
        }
    }

    /// Append in order, evicting the oldest samples beyond the horizon
    pub fn append(&mut self, batch: &[f64]) {
        if self.horizon == 0 {
            return;
        }

        // Only the tail of an oversized batch can survive
        let batch = if batch.len() > self.horizon {
            &batch[batch.len() - self.horizon..]
        } else {
            batch
        };

        let overflow = (self.samples.len() + batch.len()).saturating_sub(self.horizon);
        self.samples.drain(..overflow);
        self.samples.extend(batch.iter().copied());
    }

    /// Take every retained sample, oldest first, leaving the buffer empty
    pub fn drain(&mut self) -> Vec<f64> {
        Vec::from(std::mem::take(&mut self.samples))
    }

    /// Copy of the retained samples without consuming them
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

/// Retention buffers for a fixed channel set, shared between worker and consumer
#[derive(Debug)]
pub struct RetentionStore {
    buffers: Mutex<BTreeMap<ChannelId, ChannelRetentionBuffer>>,
    horizon: usize,
}

impl RetentionStore {
    pub fn new(channels: &[ChannelId], horizon: usize) -> Self {
        let buffers = channels
            .iter()
            .map(|&id| (id, ChannelRetentionBuffer::new(horizon)))
            .collect();
        Self {
            buffers: Mutex::new(buffers),
            horizon,
        }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.buffers.lock().keys().copied().collect()
    }

    /// Append one acquisition batch; channels not in the store are ignored
    pub fn append_batch(&self, batch: &[(ChannelId, Vec<f64>)]) {
        let mut buffers = self.buffers.lock();
        for (channel, samples) in batch {
            if let Some(buffer) = buffers.get_mut(channel) {
                buffer.append(samples);
            }
        }
    }

    pub fn drain(&self, channel: ChannelId) -> Option<Vec<f64>> {
        self.buffers.lock().get_mut(&channel).map(ChannelRetentionBuffer::drain)
    }

    pub fn drain_all(&self) -> BTreeMap<ChannelId, Vec<f64>> {
        self.buffers
            .lock()
            .iter_mut()
            .map(|(&id, buffer)| (id, buffer.drain()))
            .collect()
    }

    pub fn snapshot(&self, channel: ChannelId) -> Option<Vec<f64>> {
        self.buffers.lock().get(&channel).map(ChannelRetentionBuffer::snapshot)
    }

    pub fn snapshot_all(&self) -> BTreeMap<ChannelId, Vec<f64>> {
        self.buffers
            .lock()
            .iter()
            .map(|(&id, buffer)| (id, buffer.snapshot()))
            .collect()
    }

    pub fn clear(&self) {
        for buffer in self.buffers.lock().values_mut() {
            buffer.clear();
        }
    }

    pub fn len(&self, channel: ChannelId) -> Option<usize> {
        self.buffers.lock().get(&channel).map(ChannelRetentionBuffer::len)
    }
}
