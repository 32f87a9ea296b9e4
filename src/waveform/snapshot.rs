// src/waveform/snapshot.rs

use crate::storage::{SampleCount, SummaryColumnsMut};
use std::ops::Range;

/// Per-column min/max/RMS of one channel over a contiguous run of pixel
/// columns, tagged with the parameters that produced it.
///
/// Built and filled by `WaveformCache`, then published behind an `Arc` and
/// never modified again.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySnapshot {
    revision: Option<u64>,
    columns: usize,
    origin: f64,
    pixels_per_second: f64,
    sample_rate: u32,
    /// Unclamped sample position of column 0, used to line up later grids.
    pub(crate) grid_start: f64,
    pub(crate) boundaries: Vec<SampleCount>,
    pub(crate) minima: Vec<f32>,
    pub(crate) maxima: Vec<f32>,
    pub(crate) rms: Vec<f32>,
}

impl SummarySnapshot {
    /// The "never built" placeholder held by a fresh or invalidated slot.
    pub fn empty() -> Self {
        Self {
            revision: None,
            columns: 0,
            origin: 0.0,
            pixels_per_second: 0.0,
            sample_rate: 0,
            grid_start: 0.0,
            boundaries: vec![0],
            minima: Vec::new(),
            maxima: Vec::new(),
            rms: Vec::new(),
        }
    }

    /// Zero-filled storage for `columns` columns.
    pub fn sized(
        columns: usize,
        pixels_per_second: f64,
        sample_rate: u32,
        origin: f64,
        revision: u64,
    ) -> Self {
        Self {
            revision: Some(revision),
            columns,
            origin,
            pixels_per_second,
            sample_rate,
            grid_start: 0.0,
            boundaries: vec![0; columns + 1],
            minima: vec![0.0; columns],
            maxima: vec![0.0; columns],
            rms: vec![0.0; columns],
        }
    }

    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn origin(&self) -> f64 {
        self.origin
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn grid_start(&self) -> f64 {
        self.grid_start
    }

    pub fn boundaries(&self) -> &[SampleCount] {
        &self.boundaries
    }

    pub fn minima(&self) -> &[f32] {
        &self.minima
    }

    pub fn maxima(&self) -> &[f32] {
        &self.maxima
    }

    pub fn rms(&self) -> &[f32] {
        &self.rms
    }

    /// Whether this snapshot's columns can serve a request at the given
    /// zoom. Pixel widths may differ by rounding as long as the drift
    /// accumulated across `columns` stays under one sample period.
    pub fn is_compatible(
        &self,
        revision: u64,
        sample_rate: u32,
        pixels_per_second: f64,
        columns: usize,
    ) -> bool {
        if self.revision != Some(revision) || self.columns == 0 || self.sample_rate != sample_rate {
            return false;
        }
        let drift = (1.0 / pixels_per_second - 1.0 / self.pixels_per_second).abs() * columns as f64;
        drift < 1.0 / sample_rate as f64
    }

    /// Boundaries `range.start..=range.end` plus writable reductions for
    /// the columns in `range`.
    pub(crate) fn split_mut(
        &mut self,
        range: Range<usize>,
    ) -> (&[SampleCount], SummaryColumnsMut<'_>) {
        (
            &self.boundaries[range.start..=range.end],
            SummaryColumnsMut {
                min: &mut self.minima[range.clone()],
                max: &mut self.maxima[range.clone()],
                rms: &mut self.rms[range],
            },
        )
    }

    /// Copy reductions for old columns `src_start..` into `dst`.
    pub(crate) fn copy_columns(&mut self, from: &Self, dst: Range<usize>, src_start: usize) {
        let src = src_start..src_start + dst.len();
        self.minima[dst.clone()].copy_from_slice(&from.minima[src.clone()]);
        self.maxima[dst.clone()].copy_from_slice(&from.maxima[src.clone()]);
        self.rms[dst].copy_from_slice(&from.rms[src]);
    }
}

impl Default for SummarySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
