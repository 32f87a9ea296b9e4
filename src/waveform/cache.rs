// src/waveform/cache.rs

use super::grid;
use super::snapshot::SummarySnapshot;
use super::view::{FetchOutcome, SummaryBuffer, SummaryView};
use crate::clip::{Clip, ClipChannel, Revision};
use crate::storage::{ColumnStats, SampleCount, SummaryColumnsMut, clip_range};
use anyhow::{Context, Result, anyhow, bail};
use log::{debug, trace};
use std::ops::Range;
use std::sync::Arc;

/// A window of pixel columns to summarize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SummaryRequest {
    /// Time of column 0 in seconds, relative to the visible clip start.
    /// The clip's left trim is added by the cache.
    pub origin: f64,
    pub pixels_per_second: f64,
    pub columns: usize,
}

impl SummaryRequest {
    pub fn new(origin: f64, pixels_per_second: f64, columns: usize) -> Self {
        Self {
            origin,
            pixels_per_second,
            columns,
        }
    }
}

/// Per-clip cache of waveform summaries: one snapshot per channel.
///
/// A fetch either hands back the current snapshot, or builds a replacement
/// that copies whatever columns of the old one still line up and computes
/// the rest. Staleness is tracked by the clip's `Revision`.
#[derive(Debug)]
pub struct WaveformCache {
    slots: Vec<Arc<SummarySnapshot>>,
    revision: Revision,
}

impl WaveformCache {
    /// `revision` must be the counter of the clip this cache serves;
    /// `Clip::waveform_cache` wires that up.
    pub fn new(channels: usize, revision: Revision) -> Self {
        Self {
            slots: (0..channels).map(|_| Arc::new(SummarySnapshot::empty())).collect(),
            revision,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.slots.len()
    }

    /// The snapshot currently held for `channel`.
    pub fn snapshot(&self, channel: usize) -> Option<Arc<SummarySnapshot>> {
        self.slots.get(channel).cloned()
    }

    /// Lazy invalidation: every snapshot becomes stale on the next fetch.
    pub fn mark_changed(&self) {
        self.revision.bump();
    }

    /// Drop every snapshot.
    pub fn invalidate(&mut self) {
        for slot in &mut self.slots {
            *slot = Arc::new(SummarySnapshot::empty());
        }
    }

    /// Summaries for `request` on `channel`. The result becomes the
    /// channel's cached snapshot.
    pub fn fetch(&mut self, clip: &Clip, channel: usize, request: SummaryRequest) -> Result<SummaryView> {
        let (snapshot, outcome) = self.resolve(clip, channel, &request)?;
        if outcome != FetchOutcome::Empty {
            self.slots[channel] = Arc::clone(&snapshot);
        }
        Ok(SummaryView::new(snapshot, request.columns, outcome))
    }

    /// Like `fetch`, but writes into `out` and leaves the cached snapshot
    /// untouched. Anything short of a full hit is recomputed on every call.
    pub fn fetch_into(
        &self,
        clip: &Clip,
        channel: usize,
        request: SummaryRequest,
        out: &mut SummaryBuffer,
    ) -> Result<FetchOutcome> {
        let (snapshot, outcome) = self.resolve(clip, channel, &request)?;
        out.fill_from(&snapshot, request.columns);
        Ok(outcome)
    }

    fn resolve(
        &self,
        clip: &Clip,
        channel: usize,
        request: &SummaryRequest,
    ) -> Result<(Arc<SummarySnapshot>, FetchOutcome)> {
        let old = self
            .slots
            .get(channel)
            .ok_or_else(|| anyhow!("channel {channel} out of range ({} cached)", self.slots.len()))?;

        let pps = request.pixels_per_second;
        if !(pps.is_finite() && pps > 0.0) {
            bail!("pixels per second must be positive, got {pps}");
        }
        let origin = request.origin + clip.trim_left();
        if !origin.is_finite() {
            bail!("origin must be a finite time, got {}", request.origin);
        }
        let columns = request.columns;
        let rate = clip.sample_rate();
        let rate_f = rate as f64;
        let samples_per_pixel = rate_f / pps;
        let revision = self.revision.current();

        if columns == 0 {
            let mut empty = SummarySnapshot::sized(0, pps, rate, origin, revision);
            empty.grid_start =
                grid::fill_boundaries(&mut empty.boundaries, 0.0, origin, rate_f, samples_per_pixel);
            return Ok((Arc::new(empty), FetchOutcome::Empty));
        }

        // 1. Full hit
        let compatible = old.is_compatible(revision, rate, pps, columns);
        if compatible && old.origin() == origin && old.columns() >= columns {
            trace!("channel {channel}: cache hit for {columns} columns at {origin}s");
            return Ok((Arc::clone(old), FetchOutcome::Hit));
        }

        // 2. Line up with the old grid
        let mut correction = 0.0;
        let mut reuse = None;
        if compatible {
            let alignment = grid::find_correction(
                old.grid_start(),
                old.columns(),
                columns,
                origin,
                rate_f,
                samples_per_pixel,
            );
            correction = alignment.correction;
            let copy = alignment.copy_range(old.columns(), columns);
            if !copy.is_empty() {
                reuse = Some(((copy.start as i64 + alignment.old_x0) as usize, copy));
            }
        }

        // 3. Fresh boundaries, copied reductions
        let mut fresh = SummarySnapshot::sized(columns, pps, rate, origin, revision);
        fresh.grid_start =
            grid::fill_boundaries(&mut fresh.boundaries, correction, origin, rate_f, samples_per_pixel);

        let (outcome, gaps) = match reuse {
            Some((src_start, copy)) => {
                fresh.copy_columns(old, copy.clone(), src_start);
                let gaps = [0..copy.start, copy.end..columns];
                (FetchOutcome::Partial { reused: copy }, gaps)
            }
            None => (FetchOutcome::Rebuilt, [0..columns, columns..columns]),
        };

        // 4. Everything else from storage or the append buffer. The read
        // lock keeps the committed length and append contents consistent.
        {
            let data = clip.read_channel(channel)?;
            for gap in gaps {
                if gap.is_empty() {
                    continue;
                }
                let (start, end) = (gap.start, gap.end);
                fill_gap(&data, &mut fresh, gap)
                    .with_context(|| format!("summarizing columns {start}..{end} of channel {channel}"))?;
            }
        }

        debug!(
            "channel {channel}: rebuilt {columns} columns at {origin}s, {pps} px/s ({} reused)",
            outcome.reused_columns()
        );
        Ok((Arc::new(fresh), outcome))
    }
}

/// Compute the columns in `gap`. Columns lying wholly in committed storage
/// go to the store in one call. From the first column that reaches past
/// the committed samples onward, the append buffer is scanned directly:
/// it is always the tail, so nothing to the right can come from the store.
fn fill_gap(data: &ClipChannel, snapshot: &mut SummarySnapshot, gap: Range<usize>) -> Result<()> {
    let committed = data.committed_len();
    let (bounds, mut out) = snapshot.split_mut(gap);
    let n = out.len();

    let split = (0..n).find(|&k| bounds[k + 1] > committed).unwrap_or(n);

    if split > 0 {
        data.store().summarize(
            &bounds[..=split],
            SummaryColumnsMut {
                min: &mut out.min[..split],
                max: &mut out.max[..split],
                rms: &mut out.rms[..split],
            },
        )?;
    }

    let append = data.append_buffer();
    let append_len = append.len() as SampleCount;
    for k in split..n {
        let (start, end) = (bounds[k], bounds[k + 1]);
        let mut stats = ColumnStats::new();

        // Only the first tail column can straddle the commit point.
        if start < committed {
            stats.merge(&data.store().column_stats(start, committed)?);
        }
        if let Some((lo, hi)) = clip_range(start - committed, end - committed, append_len) {
            stats.extend(&append.floats(lo..hi));
        }

        out.set(k, stats.finish());
    }
    Ok(())
}
