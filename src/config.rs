// src/config.rs

use crate::storage::SampleFormat;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

/// Describes a clip: its sampling rate, layout and capture format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClipSpec {
    pub sample_rate: u32,
    pub channels: usize,
    pub trim_left: f64, // seconds hidden at the clip start
    pub capture_format: SampleFormat,
}

impl Default for ClipSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            trim_left: 0.0,
            capture_format: SampleFormat::Float,
        }
    }
}

/// Tuning for the live capture pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Interleaved samples the capture ring can hold.
    pub ring_capacity: usize,
    /// Per-channel append-buffer length that triggers a commit.
    pub commit_threshold: usize,
    /// Writer-thread sleep when the ring is empty.
    pub idle_poll_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 192_000,
            commit_threshold: 65_536,
            idle_poll_ms: 5,
        }
    }
}

/// Top-level document tying a clip to its capture settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub clip: ClipSpec,
    pub capture: CaptureConfig,
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_disk(path: &str) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_disk(&self, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.clip.sample_rate == 0 {
            bail!("sample_rate must be positive");
        }
        if self.clip.channels == 0 {
            bail!("a clip needs at least one channel");
        }
        if !self.clip.trim_left.is_finite() || self.clip.trim_left < 0.0 {
            bail!("trim_left must be a non-negative number of seconds");
        }
        if self.capture.ring_capacity < self.clip.channels {
            bail!("ring_capacity must hold at least one frame");
        }
        Ok(())
    }
}
