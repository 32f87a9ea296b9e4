// src/recorder/mod.rs

pub mod writer;

use crate::clip::Clip;
use crate::config::CaptureConfig;
use crate::recorder::writer::ClipWriter;
use anyhow::{Result, anyhow, bail};
use log::warn;
use ringbuf::traits::{Observer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Live capture into a clip.
///
/// `push_interleaved` stands in for the audio input callback: it only
/// touches the lock-free ring. A writer thread moves the frames into the
/// clip's append buffers, where the waveform cache can already see them.
pub struct Recorder {
    producer: HeapProd<f32>,
    writer_handle: Option<thread::JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    recorded_frames: Arc<AtomicU64>,
    channels: usize,
    sample_rate: u32,
}

impl Recorder {
    pub fn start(clip: Arc<Clip>, config: &CaptureConfig) -> Result<Self> {
        let channels = clip.channel_count();
        if channels == 0 {
            bail!("cannot record into a clip without channels");
        }
        if config.ring_capacity < channels {
            bail!(
                "ring capacity {} cannot hold one {channels}-channel frame",
                config.ring_capacity
            );
        }

        let rb = HeapRb::<f32>::new(config.ring_capacity);
        let (producer, consumer) = rb.split();

        let running = Arc::new(AtomicBool::new(true));
        let recorded_frames = Arc::new(AtomicU64::new(0));
        let sample_rate = clip.sample_rate();

        let writer = ClipWriter::new(clip, config);
        let running_clone = running.clone();
        let recorded_clone = recorded_frames.clone();
        let writer_handle = thread::spawn(move || {
            let result = writer.run(consumer, running_clone, recorded_clone);
            if let Err(e) = &result {
                warn!("capture writer stopped: {e:#}");
            }
            result
        });

        Ok(Self {
            producer,
            writer_handle: Some(writer_handle),
            running,
            recorded_frames,
            channels,
            sample_rate,
        })
    }

    /// Queue interleaved samples. Only whole frames are accepted; when the
    /// ring is full the remainder is dropped. Returns samples accepted.
    pub fn push_interleaved(&mut self, data: &[f32]) -> usize {
        let room = self.producer.vacant_len() / self.channels * self.channels;
        let whole = data.len() / self.channels * self.channels;
        let n = room.min(whole);
        if n == 0 {
            return 0;
        }
        self.producer.push_slice(&data[..n])
    }

    pub fn recorded_frames(&self) -> u64 {
        self.recorded_frames.load(Ordering::Relaxed)
    }

    /// Recording time based on frames handed to the clip.
    pub fn record_time(&self) -> Duration {
        Duration::from_secs_f64(self.recorded_frames() as f64 / self.sample_rate as f64)
    }

    /// Stop capturing, wait for the writer and commit the remainder.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.running.store(false, Ordering::Release);
        match self.writer_handle.take() {
            Some(h) => h.join().map_err(|_| anyhow!("capture writer panicked"))?,
            None => Ok(()),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        // errors were already logged by the writer thread
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClipSpec;
    use crate::waveform::{FetchOutcome, SummaryRequest};
    use std::time::Instant;

    fn stereo_clip() -> Arc<Clip> {
        Arc::new(Clip::new(&ClipSpec {
            sample_rate: 44_100,
            channels: 2,
            ..ClipSpec::default()
        }))
    }

    fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn stop_commits_everything_pushed() {
        let clip = stereo_clip();
        let config = CaptureConfig {
            commit_threshold: 1_000_000,
            ..CaptureConfig::default()
        };
        let mut recorder = Recorder::start(clip.clone(), &config).unwrap();

        let frames: Vec<f32> = (0..1000).flat_map(|i| [i as f32 / 1000.0, -0.5]).collect();
        assert_eq!(recorder.push_interleaved(&frames), 2000);
        recorder.stop().unwrap();

        let left = clip.read_channel(0).unwrap();
        let right = clip.read_channel(1).unwrap();
        assert_eq!(left.committed_len(), 1000);
        assert_eq!(right.committed_len(), 1000);
        assert!(left.append_buffer().is_empty());
    }

    #[test]
    fn partial_frames_are_refused() {
        let clip = stereo_clip();
        let mut recorder = Recorder::start(clip, &CaptureConfig::default()).unwrap();
        assert_eq!(recorder.push_interleaved(&[0.1, 0.2, 0.3]), 2);
        assert_eq!(recorder.push_interleaved(&[0.1]), 0);
    }

    #[test]
    fn full_ring_drops_the_remainder() {
        let clip = stereo_clip();
        let config = CaptureConfig {
            ring_capacity: 8,
            ..CaptureConfig::default()
        };
        let mut recorder = Recorder::start(clip, &config).unwrap();
        let accepted = recorder.push_interleaved(&[0.0; 20]);
        assert!(accepted <= 8);
        assert_eq!(accepted % 2, 0);
    }

    #[test]
    fn summaries_follow_live_capture() {
        let clip = stereo_clip();
        let config = CaptureConfig {
            commit_threshold: 441 * 3,
            idle_poll_ms: 1,
            ..CaptureConfig::default()
        };
        let mut recorder = Recorder::start(clip.clone(), &config).unwrap();

        let block: Vec<f32> = (0..441).flat_map(|_| [0.5, -0.25]).collect();
        recorder.push_interleaved(&block);
        wait_for(|| recorder.recorded_frames() >= 441);

        let request = SummaryRequest::new(0.0, 100.0, 4);
        let first = {
            let mut cache = clip.waveform_cache().lock().unwrap();
            cache.fetch(&clip, 0, request).unwrap()
        };
        assert_eq!(first.maxima()[0], 0.5);
        assert_eq!(first.maxima()[1], 0.0);

        for _ in 0..3 {
            recorder.push_interleaved(&block);
        }
        wait_for(|| recorder.recorded_frames() >= 441 * 4);

        let second = {
            let mut cache = clip.waveform_cache().lock().unwrap();
            cache.fetch(&clip, 1, request).unwrap()
        };
        assert_ne!(second.outcome(), &FetchOutcome::Hit);
        assert!(second.minima().iter().all(|&v| v == -0.25));

        recorder.stop().unwrap();
        assert!(clip.read_channel(1).unwrap().committed_len() >= 441 * 4);
    }

    #[test]
    fn record_time_tracks_frames() {
        let clip = stereo_clip();
        let mut recorder = Recorder::start(clip, &CaptureConfig::default()).unwrap();
        recorder.push_interleaved(&vec![0.0; 44_100 * 2]);
        wait_for(|| recorder.recorded_frames() == 44_100);
        assert_eq!(recorder.record_time(), Duration::from_secs(1));
    }
}
