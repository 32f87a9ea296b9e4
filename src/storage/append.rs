// src/storage/append.rs

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;

const I24_MAX: f32 = 8_388_607.0;

/// Format in which the capture path keeps not-yet-committed samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    Int16,
    Int24,
    #[default]
    Float,
}

#[derive(Debug, Clone)]
enum Samples {
    Int16(Vec<i16>),
    /// 24-bit PCM, one sample per i32.
    Int24(Vec<i32>),
    Float(Vec<f32>),
}

/// Tail of the most recently captured samples, not yet committed to the
/// channel's `SampleStore`.
#[derive(Debug, Clone)]
pub struct AppendBuffer {
    samples: Samples,
}

impl AppendBuffer {
    pub fn new(format: SampleFormat) -> Self {
        let samples = match format {
            SampleFormat::Int16 => Samples::Int16(Vec::new()),
            SampleFormat::Int24 => Samples::Int24(Vec::new()),
            SampleFormat::Float => Samples::Float(Vec::new()),
        };
        Self { samples }
    }

    pub fn format(&self) -> SampleFormat {
        match self.samples {
            Samples::Int16(_) => SampleFormat::Int16,
            Samples::Int24(_) => SampleFormat::Int24,
            Samples::Float(_) => SampleFormat::Float,
        }
    }

    pub fn len(&self) -> usize {
        match &self.samples {
            Samples::Int16(v) => v.len(),
            Samples::Int24(v) => v.len(),
            Samples::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store float samples in this buffer's format. Integer formats clamp
    /// to [-1, 1] and map non-finite input to silence.
    pub fn push_floats(&mut self, input: &[f32]) {
        match &mut self.samples {
            Samples::Float(v) => v.extend_from_slice(input),
            Samples::Int16(v) => v.extend(
                input
                    .iter()
                    .map(|&s| (sanitize(s) * i16::MAX as f32) as i16),
            ),
            Samples::Int24(v) => v.extend(input.iter().map(|&s| (sanitize(s) * I24_MAX) as i32)),
        }
    }

    /// Samples in `range` as f32. Borrowed when already float.
    pub fn floats(&self, range: Range<usize>) -> Cow<'_, [f32]> {
        match &self.samples {
            Samples::Float(v) => Cow::Borrowed(&v[range]),
            Samples::Int16(v) => Cow::Owned(
                v[range]
                    .iter()
                    .map(|&s| s as f32 / i16::MAX as f32)
                    .collect(),
            ),
            Samples::Int24(v) => Cow::Owned(v[range].iter().map(|&s| s as f32 / I24_MAX).collect()),
        }
    }

    /// Drain the whole buffer as f32, leaving it empty in the same format.
    pub fn take_floats(&mut self) -> Vec<f32> {
        let out = self.floats(0..self.len()).into_owned();
        match &mut self.samples {
            Samples::Int16(v) => v.clear(),
            Samples::Int24(v) => v.clear(),
            Samples::Float(v) => v.clear(),
        }
        out
    }
}

fn sanitize(s: f32) -> f32 {
    if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 }
}
