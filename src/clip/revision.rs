// src/clip/revision.rs

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Change counter shared by a clip and its waveform cache.
///
/// Bumped whenever clip content changes in a way that makes cached
/// summaries stale. Only ever increases. Clones share the same counter.
#[derive(Clone, Debug, Default)]
pub struct Revision(Arc<AtomicU64>);

impl Revision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Returns the new value.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_counter() {
        let a = Revision::new();
        let b = a.clone();
        assert_eq!(a.current(), 0);

        assert_eq!(b.bump(), 1);
        assert_eq!(a.bump(), 2);
        assert_eq!(b.current(), 2);
    }
}
