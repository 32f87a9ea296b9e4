// src/clip/mod.rs

pub mod revision;

pub use revision::Revision;

use crate::config::ClipSpec;
use crate::storage::{AppendBuffer, MemoryStore, SampleCount, SampleStore};
use crate::waveform::WaveformCache;
use anyhow::{Result, anyhow, bail};
use log::debug;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClipId(String);

impl From<Uuid> for ClipId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Samples of one channel: the committed store followed by the append
/// buffer. Always accessed through the clip's per-channel `RwLock`, so a
/// reader sees committed length and append contents from the same moment.
#[derive(Debug)]
pub struct ClipChannel {
    store: Box<dyn SampleStore>,
    append: AppendBuffer,
}

impl ClipChannel {
    pub fn store(&self) -> &dyn SampleStore {
        self.store.as_ref()
    }

    pub fn append_buffer(&self) -> &AppendBuffer {
        &self.append
    }

    pub fn committed_len(&self) -> SampleCount {
        self.store.num_samples()
    }

    pub fn total_len(&self) -> SampleCount {
        self.committed_len() + self.append.len() as SampleCount
    }
}

/// An audio clip as seen by the waveform cache.
pub struct Clip {
    id: ClipId,
    sample_rate: u32,
    trim_left: f64,
    channels: Vec<RwLock<ClipChannel>>,
    revision: Revision,
    spec: ClipSpec,
    waveform: OnceLock<Mutex<WaveformCache>>,
}

impl fmt::Debug for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clip")
            .field("id", &self.id)
            .field("sample_rate", &self.sample_rate)
            .field("trim_left", &self.trim_left)
            .field("channels", &self.channels.len())
            .field("revision", &self.revision.current())
            .finish()
    }
}

impl Clip {
    /// Empty clip with in-memory committed storage.
    pub fn new(spec: &ClipSpec) -> Self {
        let stores = (0..spec.channels)
            .map(|_| Box::new(MemoryStore::new()) as Box<dyn SampleStore>)
            .collect();
        Self::build(spec, stores)
    }

    pub fn with_stores(spec: &ClipSpec, stores: Vec<Box<dyn SampleStore>>) -> Result<Self> {
        if stores.len() != spec.channels {
            bail!(
                "clip declares {} channels but {} stores were supplied",
                spec.channels,
                stores.len()
            );
        }
        Ok(Self::build(spec, stores))
    }

    fn build(spec: &ClipSpec, stores: Vec<Box<dyn SampleStore>>) -> Self {
        let channels = stores
            .into_iter()
            .map(|store| {
                RwLock::new(ClipChannel {
                    store,
                    append: AppendBuffer::new(spec.capture_format),
                })
            })
            .collect();

        Self {
            id: Uuid::new_v4().into(),
            sample_rate: spec.sample_rate,
            trim_left: spec.trim_left,
            channels,
            revision: Revision::new(),
            spec: spec.clone(),
            waveform: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &ClipId {
        &self.id
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn trim_left(&self) -> f64 {
        self.trim_left
    }

    /// Trimming moves the visible origin only; cached summaries stay valid
    /// because snapshots record trim-adjusted origins.
    pub fn set_trim_left(&mut self, secs: f64) {
        self.trim_left = secs.max(0.0);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn mark_changed(&self) {
        self.revision.bump();
    }

    pub fn read_channel(&self, channel: usize) -> Result<RwLockReadGuard<'_, ClipChannel>> {
        self.channels
            .get(channel)
            .ok_or_else(|| anyhow!("channel {channel} out of range ({} channels)", self.channels.len()))?
            .read()
            .map_err(|_| anyhow!("channel {channel} lock poisoned"))
    }

    fn write_channel(&self, channel: usize) -> Result<RwLockWriteGuard<'_, ClipChannel>> {
        self.channels
            .get(channel)
            .ok_or_else(|| anyhow!("channel {channel} out of range ({} channels)", self.channels.len()))?
            .write()
            .map_err(|_| anyhow!("channel {channel} lock poisoned"))
    }

    /// Add captured samples to the channel's append buffer.
    pub fn append(&self, channel: usize, samples: &[f32]) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }
        self.write_channel(channel)?.append.push_floats(samples);
        // Bump only once the samples are visible, so a snapshot tagged with
        // the new revision can never miss them.
        self.revision.bump();
        Ok(())
    }

    /// Split an interleaved block across channels and append it.
    pub fn append_interleaved(&self, samples: &[f32]) -> Result<()> {
        let channels = self.channels.len();
        if samples.is_empty() || channels == 0 {
            return Ok(());
        }
        let frames = samples.len() / channels;
        let mut planar = vec![0.0f32; frames];
        for c in 0..channels {
            for (dst, frame) in planar.iter_mut().zip(samples.chunks_exact(channels)) {
                *dst = frame[c];
            }
            self.write_channel(c)?.append.push_floats(&planar);
        }
        self.revision.bump();
        Ok(())
    }

    /// Move the channel's append buffer into committed storage. Sample
    /// values are unchanged, so the revision is left alone.
    /// Returns the number of samples committed.
    pub fn commit(&self, channel: usize) -> Result<usize> {
        let mut guard = self.write_channel(channel)?;
        if guard.append.is_empty() {
            return Ok(0);
        }
        let pending = guard.append.take_floats();
        guard.store.commit(&pending)?;
        debug!(
            "clip {}: committed {} samples on channel {} ({} total)",
            self.id,
            pending.len(),
            channel,
            guard.committed_len()
        );
        Ok(pending.len())
    }

    pub fn commit_all(&self) -> Result<usize> {
        let mut total = 0;
        for c in 0..self.channels.len() {
            total += self.commit(c)?;
        }
        Ok(total)
    }

    /// Swap a channel's committed storage. Pending append samples are
    /// dropped along with the old store.
    pub fn replace_store(&mut self, channel: usize, store: Box<dyn SampleStore>) -> Result<()> {
        let format = self.spec.capture_format;
        {
            let mut guard = self.write_channel(channel)?;
            guard.store = store;
            guard.append = AppendBuffer::new(format);
        }
        self.revision.bump();
        if let Some(cache) = self.waveform.get_mut() {
            cache.get_mut().unwrap_or_else(PoisonError::into_inner).invalidate();
        }
        Ok(())
    }

    /// Add a channel. The cache is recreated with the new layout on next use.
    pub fn push_channel(&mut self, store: Box<dyn SampleStore>) {
        self.channels.push(RwLock::new(ClipChannel {
            store,
            append: AppendBuffer::new(self.spec.capture_format),
        }));
        self.spec.channels = self.channels.len();
        self.revision.bump();
        self.waveform = OnceLock::new();
    }

    /// The clip's waveform cache, created on first use.
    pub fn waveform_cache(&self) -> &Mutex<WaveformCache> {
        self.waveform
            .get_or_init(|| Mutex::new(WaveformCache::new(self.channels.len(), self.revision.clone())))
    }
}
