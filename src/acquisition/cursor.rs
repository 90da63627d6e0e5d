// src/acquisition/cursor.rs
//! Read planning against a wrapping device write cursor
//!
//! The instrument writes into a circular buffer of `capacity` slots and
//! reports the slot it will write next. Given where the host stopped reading,
//! [`plan_reads`] works out which contiguous slices hold new samples, oldest
//! first. When the unread region crosses the end of the buffer the plan is
//! split in two.
//!
//! Nothing here can tell a full lap from an empty one: if `capacity` or more
//! samples arrive between two polls the overrun goes unnoticed.

use serde::{Deserialize, Serialize};

/// Contiguous slice of the device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    pub start: usize,
    pub len: usize,
}

impl SampleRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last slot covered
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// How the second half of a wrapped read is sized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapPolicy {
    /// Second range is `(0, write_index + 1)`. The extra slot at
    /// `write_index` is read again on the next poll, so every wrap yields one
    /// duplicated sample.
    #[default]
    InclusiveBoundary,

    /// Second range is `(0, write_index)`: exactly the available samples.
    Exact,
}

impl WrapPolicy {
    fn wrap_adjustment(self) -> usize {
        match self {
            WrapPolicy::InclusiveBoundary => 1,
            WrapPolicy::Exact => 0,
        }
    }
}

/// Slices to read for one poll, in chronological order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadPlan {
    Idle,
    Contiguous(SampleRange),
    Wrapped(SampleRange, SampleRange),
}

impl ReadPlan {
    pub fn ranges(&self) -> impl Iterator<Item = SampleRange> {
        let (first, second) = match *self {
            ReadPlan::Idle => (None, None),
            ReadPlan::Contiguous(range) => (Some(range), None),
            ReadPlan::Wrapped(tail, head) => (Some(tail), Some(head)),
        };
        first.into_iter().chain(second)
    }

    /// Samples the plan reads in total
    pub fn total_len(&self) -> usize {
        self.ranges().map(|r| r.len).sum()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ReadPlan::Idle)
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, ReadPlan::Wrapped(..))
    }
}

/// Samples written since `read_index`, modulo `capacity`
pub fn available_samples(read_index: usize, write_index: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    let read_index = read_index % capacity;
    let write_index = write_index % capacity;
    (write_index + capacity - read_index) % capacity
}

/// Work out which slices hold samples written since `read_index`
///
/// Indices are expected in `[0, capacity)` and are reduced modulo `capacity`
/// otherwise. A zero capacity never has anything to read.
pub fn plan_reads(read_index: usize, write_index: usize, capacity: usize, policy: WrapPolicy) -> ReadPlan {
    let available = available_samples(read_index, write_index, capacity);
    if available == 0 {
        return ReadPlan::Idle;
    }

    let read_index = read_index % capacity;
    if read_index + available <= capacity {
        return ReadPlan::Contiguous(SampleRange::new(read_index, available));
    }

    let tail_len = capacity - read_index;
    let head_len = available - tail_len + policy.wrap_adjustment();
    ReadPlan::Wrapped(SampleRange::new(read_index, tail_len), SampleRange::new(0, head_len))
}

/// Owns the host read cursor for one device buffer
#[derive(Debug, Clone)]
pub struct RingCursorTracker {
    read_index: usize,
    capacity: usize,
    policy: WrapPolicy,
}

impl RingCursorTracker {
    pub fn new(capacity: usize, start_index: usize, policy: WrapPolicy) -> Self {
        Self {
            read_index: if capacity == 0 { 0 } else { start_index % capacity },
            capacity,
            policy,
        }
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> WrapPolicy {
        self.policy
    }

    /// Plan the reads needed to catch up with `write_index`
    pub fn plan(&self, write_index: usize) -> ReadPlan {
        plan_reads(self.read_index, write_index, self.capacity, self.policy)
    }

    /// Mark everything up to `write_index` as consumed
    pub fn commit(&mut self, write_index: usize) {
        if self.capacity > 0 {
            self.read_index = write_index % self.capacity;
        }
    }
}
