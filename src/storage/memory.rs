// src/storage/memory.rs

use super::{ColumnStats, SampleCount, SampleStore, SummaryColumnsMut, clip_range};
use anyhow::{Result, bail};

/// Committed samples kept in memory as f32.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    samples: Vec<f32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

impl SampleStore for MemoryStore {
    fn num_samples(&self) -> SampleCount {
        self.samples.len() as SampleCount
    }

    fn summarize(&self, boundaries: &[SampleCount], mut out: SummaryColumnsMut<'_>) -> Result<()> {
        if boundaries.len() != out.len() + 1 {
            bail!(
                "expected {} boundaries for {} columns, got {}",
                out.len() + 1,
                out.len(),
                boundaries.len()
            );
        }

        for (column, edges) in boundaries.windows(2).enumerate() {
            out.set(column, self.column_stats(edges[0], edges[1])?.finish());
        }
        Ok(())
    }

    fn column_stats(&self, start: SampleCount, end: SampleCount) -> Result<ColumnStats> {
        let mut stats = ColumnStats::new();
        if let Some((lo, hi)) = clip_range(start, end, self.num_samples()) {
            stats.extend(&self.samples[lo..hi]);
        }
        Ok(stats)
    }

    fn commit(&mut self, samples: &[f32]) -> Result<()> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }
}
