// src/storage/mod.rs

pub mod append;
pub mod memory;

pub use append::{AppendBuffer, SampleFormat};
pub use memory::MemoryStore;

use anyhow::Result;
use std::fmt;

/// Absolute sample index inside a channel. Signed so that boundaries
/// computed for times before the clip start stay representable.
pub type SampleCount = i64;

/// Output slices for one bulk reduction. All three have the same length,
/// one entry per column.
pub struct SummaryColumnsMut<'a> {
    pub min: &'a mut [f32],
    pub max: &'a mut [f32],
    pub rms: &'a mut [f32],
}

impl SummaryColumnsMut<'_> {
    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    pub fn set(&mut self, column: usize, (min, max, rms): (f32, f32, f32)) {
        self.min[column] = min;
        self.max[column] = max;
        self.rms[column] = rms;
    }
}

/// Durable, committed sample storage for one channel.
///
/// `summarize` receives `columns + 1` boundaries and must write one
/// min/max/RMS triple per column. Ranges reaching outside the stored
/// samples are clipped; a column with no samples reduces to zeros.
pub trait SampleStore: Send + Sync + fmt::Debug {
    /// Number of committed samples.
    fn num_samples(&self) -> SampleCount;

    fn summarize(&self, boundaries: &[SampleCount], out: SummaryColumnsMut<'_>) -> Result<()>;

    /// Unfinished reduction of `start..end`, for merging with samples that
    /// live outside the store.
    fn column_stats(&self, start: SampleCount, end: SampleCount) -> Result<ColumnStats>;

    /// Append samples to the end of committed storage.
    fn commit(&mut self, samples: &[f32]) -> Result<()>;
}

/// Running reduction over one column's samples.
///
/// Both the append-buffer scan and `MemoryStore` reduce through this type,
/// so a column gives the same numbers whichever path produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnStats {
    min: f32,
    max: f32,
    sum_sq: f64,
    count: u64,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnStats {
    pub const fn new() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            sum_sq: 0.0,
            count: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, s: f32) {
        if s < self.min {
            self.min = s;
        }
        if s > self.max {
            self.max = s;
        }
        self.sum_sq += s as f64 * s as f64;
        self.count += 1;
    }

    pub fn extend(&mut self, samples: &[f32]) {
        for &s in samples {
            self.push(s);
        }
    }

    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum_sq += other.sum_sq;
        self.count += other.count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// (min, max, rms). An empty column reduces to zeros.
    pub fn finish(&self) -> (f32, f32, f32) {
        if self.count == 0 {
            return (0.0, 0.0, 0.0);
        }
        let rms = (self.sum_sq / self.count as f64).sqrt() as f32;
        (self.min, self.max, rms)
    }
}

/// Clip `[start, end)` to `[0, len)`. Returns `None` for an empty result.
pub(crate) fn clip_range(
    start: SampleCount,
    end: SampleCount,
    len: SampleCount,
) -> Option<(usize, usize)> {
    let lo = start.clamp(0, len);
    let hi = end.clamp(0, len);
    (hi > lo).then_some((lo as usize, hi as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_extrema_and_rms() {
        let mut stats = ColumnStats::new();
        stats.extend(&[0.5, -1.0, 0.25, 1.0]);

        let (min, max, rms) = stats.finish();
        assert_eq!(min, -1.0);
        assert_eq!(max, 1.0);
        let expected = ((0.25 + 1.0 + 0.0625 + 1.0) / 4.0f64).sqrt() as f32;
        assert!((rms - expected).abs() < 1e-6);
    }

    #[test]
    fn empty_stats_finish_as_zeros() {
        assert_eq!(ColumnStats::new().finish(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn merging_matches_a_single_pass() {
        let samples = [0.1f32, -0.4, 0.9, -0.2, 0.3, 0.0, -0.7];
        let mut whole = ColumnStats::new();
        whole.extend(&samples);

        let mut left = ColumnStats::new();
        left.extend(&samples[..3]);
        let mut right = ColumnStats::new();
        right.extend(&samples[3..]);
        left.merge(&right);

        assert_eq!(left.count(), whole.count());
        let (a_min, a_max, a_rms) = left.finish();
        let (b_min, b_max, b_rms) = whole.finish();
        assert_eq!((a_min, a_max), (b_min, b_max));
        assert!((a_rms - b_rms).abs() < 1e-6);
    }

    #[test]
    fn clip_range_handles_out_of_bounds() {
        assert_eq!(clip_range(-10, 5, 100), Some((0, 5)));
        assert_eq!(clip_range(90, 120, 100), Some((90, 100)));
        assert_eq!(clip_range(100, 120, 100), None);
        assert_eq!(clip_range(-5, -1, 100), None);
    }
}
