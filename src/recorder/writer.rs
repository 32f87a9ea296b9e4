// src/recorder/writer.rs

use crate::clip::Clip;
use crate::config::CaptureConfig;
use anyhow::Result;
use log::debug;
use ringbuf::traits::Consumer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Drains interleaved capture frames from the ring into a clip's append
/// buffers, committing them to storage in batches.
pub struct ClipWriter {
    clip: Arc<Clip>,
    channels: usize,
    commit_threshold: usize,
    idle: Duration,
}

impl ClipWriter {
    pub fn new(clip: Arc<Clip>, config: &CaptureConfig) -> Self {
        let channels = clip.channel_count();
        Self {
            clip,
            channels,
            commit_threshold: config.commit_threshold.max(1),
            idle: Duration::from_millis(config.idle_poll_ms),
        }
    }

    /// Run until `running` is cleared and the ring is empty, then commit
    /// whatever is still pending.
    pub fn run<C>(self, mut consumer: C, running: Arc<AtomicBool>, recorded_frames: Arc<AtomicU64>) -> Result<()>
    where
        C: Consumer<Item = f32>,
    {
        // Whole frames only, so every pop splits cleanly across channels.
        let mut tmp = vec![0.0f32; 4096 * self.channels];

        loop {
            let popped = consumer.pop_slice(tmp.as_mut_slice());

            if popped == 0 {
                if !running.load(Ordering::Acquire) {
                    // Pushes made before the stop flag are visible now.
                    if consumer.is_empty() {
                        break;
                    }
                    continue;
                }
                thread::sleep(self.idle);
                continue;
            }

            self.clip.append_interleaved(&tmp[..popped])?;
            recorded_frames.fetch_add((popped / self.channels) as u64, Ordering::Relaxed);

            let pending = self.clip.read_channel(0)?.append_buffer().len();
            if pending >= self.commit_threshold {
                self.clip.commit_all()?;
            }
        }

        let flushed = self.clip.commit_all()?;
        debug!("clip {}: capture finished, {flushed} samples committed on stop", self.clip.id());
        Ok(())
    }
}
