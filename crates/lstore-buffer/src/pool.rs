//! Buffer pool manager.

use crate::frame::{BufferFrame, FrameId};
use crate::replacer::{LruReplacer, Replacer};
use lstore_common::page::{ColumnPage, PageKey};
use lstore_common::{LstoreError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

/// A dirty page that was evicted from the buffer pool.
/// Caller must write this to disk to prevent data loss.
#[derive(Debug)]
pub struct EvictedPage {
    pub key: PageKey,
    pub page: ColumnPage,
}

/// Configuration for the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub num_frames: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self { num_frames: 64 }
    }
}

/// Buffer pool manager.
///
/// Manages a fixed-size pool of page frames with:
/// - Page key to frame ID mapping
/// - Free frame list for new pages
/// - LRU replacement among unpinned frames
/// - Pin counting for scoped access
#[derive(Debug)]
pub struct BufferPool {
    /// Configuration.
    config: BufferPoolConfig,
    /// Array of buffer frames.
    frames: Vec<BufferFrame>,
    /// Page key to frame ID mapping.
    page_table: Mutex<HashMap<PageKey, FrameId>>,
    /// List of free frame IDs.
    free_list: Mutex<Vec<FrameId>>,
    /// Page replacement policy.
    replacer: LruReplacer,
}

impl BufferPool {
    /// Creates a new buffer pool.
    pub fn new(config: BufferPoolConfig) -> Self {
        let num_frames = config.num_frames;

        let frames: Vec<_> = (0..num_frames)
            .map(|i| BufferFrame::new(FrameId(i as u32)))
            .collect();

        // All frames start in the free list
        let free_list: Vec<_> = (0..num_frames).map(|i| FrameId(i as u32)).collect();

        Self {
            config,
            frames,
            page_table: Mutex::new(HashMap::new()),
            free_list: Mutex::new(free_list),
            replacer: LruReplacer::new(num_frames),
        }
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.config.num_frames
    }

    /// Returns the number of free frames.
    pub fn free_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Returns the number of pages currently resident.
    pub fn page_count(&self) -> usize {
        self.page_table.lock().len()
    }

    /// Checks if a page is resident in the pool.
    pub fn contains(&self, key: &PageKey) -> bool {
        self.page_table.lock().contains_key(key)
    }

    /// Fetches a resident page from the buffer pool.
    ///
    /// Returns None when the page is not resident; the caller is expected to
    /// load it from disk and call `load_page`. The returned frame is pinned.
    pub fn fetch_page(&self, key: &PageKey) -> Option<&BufferFrame> {
        let frame_id = *self.page_table.lock().get(key)?;
        let frame = &self.frames[frame_id.0 as usize];
        frame.pin();
        self.replacer.record_access(frame_id);
        Some(frame)
    }

    /// Allocates a frame, evicting an unpinned page if necessary.
    ///
    /// Returns the frame ID and any evicted dirty page that must be flushed.
    fn allocate_frame(&self) -> Result<(FrameId, Option<EvictedPage>)> {
        // Try free list first
        {
            let mut free_list = self.free_list.lock();
            if let Some(frame_id) = free_list.pop() {
                return Ok((frame_id, None));
            }
        }

        // Evict the least recently used unpinned frame
        let victim_id = self
            .replacer
            .evict(&|fid| self.frames[fid.0 as usize].pin_count() == 0);

        if let Some(victim_id) = victim_id {
            let frame = &self.frames[victim_id.0 as usize];

            // Capture evicted page contents if dirty
            let evicted = match frame.page_key() {
                Some(key) if frame.is_dirty() => Some(EvictedPage {
                    key,
                    page: frame.read_data().clone(),
                }),
                _ => None,
            };

            // Drop the old mapping
            if let Some(old_key) = frame.page_key() {
                self.page_table.lock().remove(&old_key);
            }

            return Ok((victim_id, evicted));
        }

        Err(LstoreError::BufferPoolExhausted)
    }

    /// Installs a page into a freshly allocated frame.
    ///
    /// If the page is already resident, the existing frame is pinned and
    /// returned untouched.
    fn install_page(
        &self,
        key: &PageKey,
        page: ColumnPage,
        dirty: bool,
    ) -> Result<(&BufferFrame, Option<EvictedPage>)> {
        if let Some(frame) = self.fetch_page(key) {
            return Ok((frame, None));
        }

        let (frame_id, evicted) = self.allocate_frame()?;

        let frame = &self.frames[frame_id.0 as usize];
        frame.reset();
        frame.set_page_key(Some(key.clone()));
        frame.install(page);
        frame.set_dirty(dirty);
        frame.pin();
        self.replacer.record_access(frame_id);

        self.page_table.lock().insert(key.clone(), frame_id);

        Ok((frame, evicted))
    }

    /// Creates a new empty page resident in a pinned frame, marked dirty.
    ///
    /// Returns (frame, evicted) where evicted contains any dirty page that
    /// was displaced to make room. Caller must write evicted pages to disk.
    pub fn new_page(&self, key: &PageKey) -> Result<(&BufferFrame, Option<EvictedPage>)> {
        self.install_page(key, ColumnPage::default(), true)
    }

    /// Loads page data read from disk into the pool.
    ///
    /// The frame is pinned and clean.
    pub fn load_page(
        &self,
        key: &PageKey,
        page: ColumnPage,
    ) -> Result<(&BufferFrame, Option<EvictedPage>)> {
        self.install_page(key, page, false)
    }

    /// Unpins a page in the buffer pool.
    ///
    /// When the pin count reaches 0 the page becomes evictable; evictability
    /// is determined by pin count during eviction, not tracked separately.
    pub fn unpin_page(&self, key: &PageKey, is_dirty: bool) -> bool {
        let frame_id = match self.page_table.lock().get(key) {
            Some(&fid) => fid,
            None => return false,
        };
        let frame = &self.frames[frame_id.0 as usize];

        if is_dirty {
            frame.set_dirty(true);
        }
        frame.unpin();
        true
    }

    /// Flushes a single page through the provided write-back closure.
    ///
    /// Returns true if the page was dirty and flushed.
    pub fn flush_page<F>(&self, key: &PageKey, mut flush_fn: F) -> Result<bool>
    where
        F: FnMut(&PageKey, &ColumnPage) -> Result<()>,
    {
        let frame_id = match self.page_table.lock().get(key) {
            Some(&fid) => fid,
            None => return Ok(false),
        };
        let frame = &self.frames[frame_id.0 as usize];

        if frame.is_dirty() {
            let data = frame.read_data();
            flush_fn(key, &data)?;
            drop(data);
            frame.set_dirty(false);
            return Ok(true);
        }
        Ok(false)
    }

    /// Flushes every dirty resident page through the write-back closure.
    ///
    /// Returns the number of pages flushed.
    pub fn flush_all<F>(&self, mut flush_fn: F) -> Result<usize>
    where
        F: FnMut(&PageKey, &ColumnPage) -> Result<()>,
    {
        // Snapshot the mapping so the closure runs without the table lock
        let resident: Vec<(PageKey, FrameId)> = self
            .page_table
            .lock()
            .iter()
            .map(|(k, &v)| (k.clone(), v))
            .collect();

        let mut flushed = 0;
        for (key, frame_id) in resident {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_dirty() {
                let data = frame.read_data();
                flush_fn(&key, &data)?;
                drop(data);
                frame.set_dirty(false);
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Removes a page from the pool without writing it back.
    ///
    /// Returns false if the page is pinned or not resident.
    pub fn delete_page(&self, key: &PageKey) -> bool {
        let mut table = self.page_table.lock();
        if let Some(frame_id) = table.remove(key) {
            let frame = &self.frames[frame_id.0 as usize];

            // Cannot delete a pinned page; reinstate the mapping
            if frame.is_pinned() {
                table.insert(key.clone(), frame_id);
                return false;
            }

            self.replacer.remove(frame_id);
            frame.reset();
            self.free_list.lock().push(frame_id);
            return true;
        }
        false
    }

    /// Drops every resident page belonging to a table, discarding dirty data.
    ///
    /// Used by table drop. Returns the number of pages removed.
    pub fn delete_pages_for(&self, table: &str) -> usize {
        let keys: Vec<PageKey> = self
            .page_table
            .lock()
            .keys()
            .filter(|k| k.table == table)
            .cloned()
            .collect();

        keys.iter().filter(|k| self.delete_page(k)).count()
    }

    /// Returns statistics about the buffer pool.
    pub fn stats(&self) -> BufferPoolStats {
        let mut pinned_count = 0;
        let mut dirty_count = 0;

        let resident: Vec<FrameId> = self.page_table.lock().values().copied().collect();
        for frame_id in &resident {
            let frame = &self.frames[frame_id.0 as usize];
            if frame.is_pinned() {
                pinned_count += 1;
            }
            if frame.is_dirty() {
                dirty_count += 1;
            }
        }

        BufferPoolStats {
            total_frames: self.config.num_frames,
            free_frames: self.free_count(),
            used_frames: resident.len(),
            pinned_frames: pinned_count,
            dirty_frames: dirty_count,
        }
    }
}

/// Statistics about the buffer pool.
#[derive(Debug, Clone)]
pub struct BufferPoolStats {
    /// Total number of frames.
    pub total_frames: usize,
    /// Number of free frames.
    pub free_frames: usize,
    /// Number of frames with pages.
    pub used_frames: usize,
    /// Number of pinned frames.
    pub pinned_frames: usize,
    /// Number of dirty frames.
    pub dirty_frames: usize,
}
