//! Page replacement policies for the buffer pool.

use crate::frame::FrameId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Trait for page replacement algorithms.
///
/// The replacer only orders victims; whether a frame may be evicted at all
/// (pin count zero) is decided by the caller through the predicate passed to
/// `evict`.
pub trait Replacer: Send + Sync {
    /// Records that the given frame was accessed.
    fn record_access(&self, frame_id: FrameId);

    /// Selects a victim among frames for which `is_evictable` returns true.
    ///
    /// Returns None if no tracked frame is evictable.
    fn evict(&self, is_evictable: &dyn Fn(FrameId) -> bool) -> Option<FrameId>;

    /// Removes a frame from the replacer.
    fn remove(&self, frame_id: FrameId);

    /// Returns the number of frames currently tracked.
    fn size(&self) -> usize;
}

/// Least-recently-used replacement.
///
/// Access order is tracked with a monotonically increasing stamp per frame;
/// stamp 0 means the frame is not tracked. Stamps are atomics, so recording
/// an access takes no lock.
#[derive(Debug)]
pub struct LruReplacer {
    /// Access stamps per frame. 0 = untracked.
    stamps: Vec<AtomicU64>,
    /// Global access counter; starts at 1 so stamps are never 0 once set.
    counter: AtomicU64,
}

impl LruReplacer {
    /// Creates a new LRU replacer with the given number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            stamps: (0..num_frames).map(|_| AtomicU64::new(0)).collect(),
            counter: AtomicU64::new(1),
        }
    }

    /// Returns the total capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.stamps.len()
    }
}

impl Replacer for LruReplacer {
    #[inline]
    fn record_access(&self, frame_id: FrameId) {
        let idx = frame_id.0 as usize;
        if idx < self.stamps.len() {
            let stamp = self.counter.fetch_add(1, Ordering::Relaxed);
            self.stamps[idx].store(stamp, Ordering::Relaxed);
        }
    }

    fn evict(&self, is_evictable: &dyn Fn(FrameId) -> bool) -> Option<FrameId> {
        let mut victim: Option<(FrameId, u64)> = None;

        for (idx, slot) in self.stamps.iter().enumerate() {
            let stamp = slot.load(Ordering::Relaxed);
            if stamp == 0 {
                continue;
            }
            let frame_id = FrameId(idx as u32);
            if !is_evictable(frame_id) {
                continue;
            }
            match victim {
                Some((_, best)) if best <= stamp => {}
                _ => victim = Some((frame_id, stamp)),
            }
        }

        if let Some((frame_id, _)) = victim {
            self.stamps[frame_id.0 as usize].store(0, Ordering::Relaxed);
            return Some(frame_id);
        }
        None
    }

    fn remove(&self, frame_id: FrameId) {
        let idx = frame_id.0 as usize;
        if idx < self.stamps.len() {
            self.stamps[idx].store(0, Ordering::Relaxed);
        }
    }

    fn size(&self) -> usize {
        self.stamps
            .iter()
            .filter(|s| s.load(Ordering::Relaxed) != 0)
            .count()
    }
}
