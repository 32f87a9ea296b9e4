// src/waveform/view.rs

use super::snapshot::SummarySnapshot;
use crate::storage::SampleCount;
use std::ops::Range;
use std::sync::Arc;

/// How a fetch produced its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Zero columns were requested.
    Empty,
    /// Served from the existing snapshot without recomputation.
    Hit,
    /// New snapshot; columns in `reused` were copied from the previous one.
    Partial { reused: Range<usize> },
    /// New snapshot computed from scratch.
    Rebuilt,
}

impl FetchOutcome {
    pub fn reused_columns(&self) -> usize {
        match self {
            Self::Partial { reused } => reused.len(),
            _ => 0,
        }
    }
}

/// Read-only result of `WaveformCache::fetch`.
///
/// Holds its own reference to the snapshot, so later cache replacements
/// don't affect it. Slices are cut to the requested column count even when
/// the snapshot covers more.
#[derive(Clone, Debug)]
pub struct SummaryView {
    snapshot: Arc<SummarySnapshot>,
    columns: usize,
    outcome: FetchOutcome,
}

impl SummaryView {
    pub(crate) fn new(snapshot: Arc<SummarySnapshot>, columns: usize, outcome: FetchOutcome) -> Self {
        Self {
            snapshot,
            columns,
            outcome,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    pub fn snapshot(&self) -> &Arc<SummarySnapshot> {
        &self.snapshot
    }

    pub fn boundaries(&self) -> &[SampleCount] {
        &self.snapshot.boundaries()[..=self.columns]
    }

    pub fn minima(&self) -> &[f32] {
        &self.snapshot.minima()[..self.columns]
    }

    pub fn maxima(&self) -> &[f32] {
        &self.snapshot.maxima()[..self.columns]
    }

    pub fn rms(&self) -> &[f32] {
        &self.snapshot.rms()[..self.columns]
    }
}

/// Caller-owned output for `WaveformCache::fetch_into`, for callers that
/// need a copy decoupled from the cache.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryBuffer {
    pub boundaries: Vec<SampleCount>,
    pub minima: Vec<f32>,
    pub maxima: Vec<f32>,
    pub rms: Vec<f32>,
}

impl SummaryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> usize {
        self.minima.len()
    }

    /// Overwrite with the first `columns` columns of `snapshot`, reusing
    /// existing allocations.
    pub(crate) fn fill_from(&mut self, snapshot: &SummarySnapshot, columns: usize) {
        self.boundaries.clear();
        self.boundaries.extend_from_slice(&snapshot.boundaries()[..=columns]);
        self.minima.clear();
        self.minima.extend_from_slice(&snapshot.minima()[..columns]);
        self.maxima.clear();
        self.maxima.extend_from_slice(&snapshot.maxima()[..columns]);
        self.rms.clear();
        self.rms.extend_from_slice(&snapshot.rms()[..columns]);
    }
}
