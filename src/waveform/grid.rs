// src/waveform/grid.rs

//! Mapping between pixel columns and sample indices.

use crate::storage::SampleCount;
use std::ops::Range;

/// How a new column grid lines up with an old one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Alignment {
    /// Old column index that new column 0 maps to. May be out of bounds.
    pub old_x0: i64,
    /// Sub-pixel shift, in samples, applied to the new grid so its cut
    /// points coincide with the old grid's.
    pub correction: f64,
}

impl Alignment {
    /// New columns whose data exists in the old grid, clipped to
    /// `0..new_len`. Empty when nothing can be reused.
    pub fn copy_range(&self, old_len: usize, new_len: usize) -> Range<usize> {
        let n = new_len as i64;
        let begin = (-self.old_x0).clamp(0, n);
        let end = (old_len as i64 - self.old_x0).clamp(0, n);
        if end > begin {
            begin as usize..end as usize
        } else {
            0..0
        }
    }
}

/// Align a new grid starting at `origin` against an old grid with the same
/// samples-per-pixel. `old_start` is the old grid's unclamped start as
/// returned by `fill_boundaries`.
///
/// Rounding old cut points against freshly generated ones would let copies
/// of copies walk away from the true positions; the correction pins the new
/// grid to the old one instead.
pub fn find_correction(
    old_start: f64,
    old_len: usize,
    new_len: usize,
    origin: f64,
    sample_rate: f64,
    samples_per_pixel: f64,
) -> Alignment {
    let old_where0 = old_start;
    let old_where_last = old_where0 + old_len as f64 * samples_per_pixel;
    let denom = old_where_last - old_where0;

    let guess_where0 = origin * sample_rate;

    let disjoint = old_where_last <= guess_where0
        || guess_where0 + new_len as f64 * samples_per_pixel <= old_where0;
    if disjoint || denom < 0.5 {
        return Alignment {
            old_x0: old_len as i64,
            correction: 0.0,
        };
    }

    let old_x0 = (0.5 + old_len as f64 * (guess_where0 - old_where0) / denom).floor();
    let where0 = old_where0 + old_x0 * samples_per_pixel;
    let correction = (where0 - guess_where0).clamp(-samples_per_pixel, samples_per_pixel);

    Alignment {
        old_x0: old_x0 as i64,
        correction,
    }
}

/// Write `out.len()` cut points for a grid starting at `origin`. Cut points
/// before the clip start are clamped at zero, so columns there are empty.
///
/// Returns the grid start before clamping, taken from the second cut point
/// so it stays on the same rounding as the rest of the grid.
pub fn fill_boundaries(
    out: &mut [SampleCount],
    correction: f64,
    origin: f64,
    sample_rate: f64,
    samples_per_pixel: f64,
) -> f64 {
    let w0 = 0.5 + correction + origin * sample_rate;
    for (x, slot) in out.iter_mut().enumerate() {
        let w = (w0 + x as f64 * samples_per_pixel).floor();
        *slot = w.max(0.0) as SampleCount;
    }
    (w0 + samples_per_pixel).floor() - samples_per_pixel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(columns: usize, origin: f64, rate: f64, pps: f64) -> Vec<SampleCount> {
        let mut out = vec![0; columns + 1];
        fill_boundaries(&mut out, 0.0, origin, rate, rate / pps);
        out
    }

    fn grid_start(origin: f64, rate: f64, pps: f64) -> f64 {
        let mut out = vec![0; 2];
        fill_boundaries(&mut out, 0.0, origin, rate, rate / pps)
    }

    #[test]
    fn boundaries_are_monotonic_and_span_the_width() {
        for &pps in &[1.0, 3.7, 100.0, 441.0, 1234.5, 44_100.0, 90_000.0] {
            for &origin in &[0.0, 0.25, 3.333, 17.0] {
                let spp = 44_100.0 / pps;
                let b = grid(500, origin, 44_100.0, pps);
                assert!(b.windows(2).all(|w| w[0] <= w[1]), "pps {pps} origin {origin}");
                let span = (b[500] - b[0]) as f64;
                assert!((span - 500.0 * spp).abs() <= 1.0, "pps {pps} origin {origin}");
            }
        }
    }

    #[test]
    fn cut_points_before_the_clip_clamp_to_zero() {
        let b = grid(200, -1.0, 44_100.0, 100.0);
        assert!(b.iter().all(|&v| v >= 0));
        assert!(b.windows(2).all(|w| w[0] <= w[1]));
        // one second of 441-sample columns lies before the clip
        assert_eq!(b[100], 0);
        assert_eq!(b[101], 441);
        assert_eq!(b[200], 44_100);
    }

    #[test]
    fn grid_start_ignores_the_clamp() {
        assert_eq!(grid_start(-1.0, 44_100.0, 100.0), -44_100.0);
        assert_eq!(grid_start(2.0, 44_100.0, 100.0), 88_200.0);
    }

    #[test]
    fn scrolling_back_onto_the_clip_reuses_columns() {
        let old_start = grid_start(-1.0, 44_100.0, 100.0);
        let a = find_correction(old_start, 200, 200, 0.0, 44_100.0, 441.0);

        assert_eq!(a.old_x0, 100);
        assert_eq!(a.correction, 0.0);
        assert_eq!(a.copy_range(200, 200), 0..100);
    }

    #[test]
    fn scrolling_right_aligns_whole_columns() {
        let old = grid_start(0.0, 44_100.0, 100.0);
        let a = find_correction(old, 1000, 1000, 2.0, 44_100.0, 441.0);

        assert_eq!(a.old_x0, 200);
        assert_eq!(a.correction, 0.0);
        assert_eq!(a.copy_range(1000, 1000), 0..800);
    }

    #[test]
    fn scrolling_left_copies_into_the_tail() {
        let old = grid_start(2.0, 44_100.0, 100.0);
        let a = find_correction(old, 1000, 1000, 0.0, 44_100.0, 441.0);

        assert_eq!(a.old_x0, -200);
        assert_eq!(a.copy_range(1000, 1000), 200..1000);
    }

    #[test]
    fn disjoint_grids_share_nothing() {
        let old = grid_start(0.0, 44_100.0, 100.0);
        let a = find_correction(old, 100, 100, 50.0, 44_100.0, 441.0);

        assert_eq!(a.correction, 0.0);
        assert!(a.copy_range(100, 100).is_empty());
    }

    #[test]
    fn fractional_shift_is_absorbed_by_correction() {
        // 100.5 samples per pixel: old cut points land on half samples
        let spp = 100.5;
        let mut old = vec![0; 201];
        let old_start = fill_boundaries(&mut old, 0.0, 0.0, 44_100.0, spp);

        // a quarter pixel past column 10
        let origin = (10.25 * spp) / 44_100.0;
        let a = find_correction(old_start, 200, 200, origin, 44_100.0, spp);
        assert_eq!(a.old_x0, 10);
        assert!(a.correction.abs() <= spp);

        let mut new = vec![0; 201];
        fill_boundaries(&mut new, a.correction, origin, 44_100.0, spp);
        for x in 0..150 {
            assert!((new[x] - old[10 + x]).abs() <= 1, "column {x}");
        }
    }
}
