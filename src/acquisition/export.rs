// src/acquisition/export.rs
//! Pairing drained samples with a relative time axis

use crate::hal::ChannelId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Samples of one channel with timestamps relative to the first sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedSamples {
    pub channel: ChannelId,
    /// Seconds; `timestamps[i] == i / sample_rate`
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl ExportedSamples {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(timestamp, value)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }
}

/// One-shot export of `values` sampled at `sample_rate_hz`
pub fn export(values: Vec<f64>, channel: ChannelId, sample_rate_hz: f64) -> ExportedSamples {
    SampleExporter::new(sample_rate_hz).export(channel, values)
}

/// Builds [`ExportedSamples`] for a fixed sample rate
#[derive(Debug, Clone, Copy)]
pub struct SampleExporter {
    sample_rate_hz: f64,
}

impl SampleExporter {
    /// `sample_rate_hz` must be positive
    pub fn new(sample_rate_hz: f64) -> Self {
        debug_assert!(sample_rate_hz > 0.0, "sample rate must be positive");
        Self { sample_rate_hz }
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Seconds between consecutive samples
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    /// Time axis for `len` samples
    pub fn timestamps(&self, len: usize) -> Vec<f64> {
        // Divide per index so the axis has exactly `len` entries without drift
        (0..len).map(|i| i as f64 / self.sample_rate_hz).collect()
    }

    pub fn export(&self, channel: ChannelId, values: Vec<f64>) -> ExportedSamples {
        ExportedSamples {
            channel,
            timestamps: self.timestamps(values.len()),
            values,
        }
    }

    pub fn export_all(&self, drained: BTreeMap<ChannelId, Vec<f64>>) -> BTreeMap<ChannelId, ExportedSamples> {
        drained
            .into_iter()
            .map(|(channel, values)| (channel, self.export(channel, values)))
            .collect()
    }
}
