// src/lib.rs

pub mod clip;
pub mod config;
pub mod recorder;
pub mod storage;
pub mod waveform;

pub use clip::{Clip, ClipId, Revision};
pub use config::{CaptureConfig, ClipSpec, SessionConfig};
pub use recorder::Recorder;
pub use storage::{MemoryStore, SampleStore};
pub use waveform::{FetchOutcome, SummaryBuffer, SummaryRequest, SummaryView, WaveformCache}; // convenience
