// src/waveform/mod.rs

pub mod cache;
pub mod grid;
pub mod snapshot;
pub mod view;

pub use cache::{SummaryRequest, WaveformCache};
pub use snapshot::SummarySnapshot;
pub use view::{FetchOutcome, SummaryBuffer, SummaryView};
