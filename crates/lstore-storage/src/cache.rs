//! Page cache: couples the page store with the buffer pool.
//!
//! All page access in the engine goes through this type. Misses load from
//! disk, dirty evictions are written back immediately, and every pin taken
//! here is released before the call returns, including on error paths.

use crate::store::PageStore;
use lstore_buffer::{BufferFrame, BufferPool, BufferPoolStats};
use lstore_common::page::{ColumnPage, PageKey};
use lstore_common::Result;

/// Shared page cache for one database.
#[derive(Debug)]
pub struct PageCache {
    /// Page-file I/O.
    store: PageStore,
    /// In-memory frame pool.
    pool: BufferPool,
}

impl PageCache {
    /// Creates a cache over a store and a pool.
    pub fn new(store: PageStore, pool: BufferPool) -> Self {
        Self { store, pool }
    }

    /// Returns the underlying page store.
    pub fn store(&self) -> &PageStore {
        &self.store
    }

    /// Returns buffer pool statistics.
    pub fn pool_stats(&self) -> BufferPoolStats {
        self.pool.stats()
    }

    /// Fetches a page into a pinned frame, loading from disk on a miss.
    fn fetch(&self, key: &PageKey) -> Result<&BufferFrame> {
        if let Some(frame) = self.pool.fetch_page(key) {
            return Ok(frame);
        }

        let page = self.store.read_page(key)?;
        let (frame, evicted) = self.pool.load_page(key, page)?;
        if let Some(evicted) = evicted {
            if let Err(e) = self.store.write_page(&evicted.key, &evicted.page) {
                self.pool.unpin_page(key, false);
                return Err(e);
            }
        }
        Ok(frame)
    }

    /// Creates a new empty page resident in the pool, marked dirty.
    pub fn create_page(&self, key: &PageKey) -> Result<()> {
        let (_, evicted) = self.pool.new_page(key)?;
        let write_back = match evicted {
            Some(evicted) => self.store.write_page(&evicted.key, &evicted.page),
            None => Ok(()),
        };
        self.pool.unpin_page(key, true);
        write_back
    }

    /// Runs a closure against a pinned page, read-only.
    pub fn with_page<R>(&self, key: &PageKey, f: impl FnOnce(&ColumnPage) -> R) -> Result<R> {
        let frame = self.fetch(key)?;
        let out = f(&frame.read_data());
        self.pool.unpin_page(key, false);
        Ok(out)
    }

    /// Runs a closure against a pinned page with write access.
    ///
    /// The page is marked dirty regardless of what the closure did.
    pub fn with_page_mut<R>(
        &self,
        key: &PageKey,
        f: impl FnOnce(&mut ColumnPage) -> R,
    ) -> Result<R> {
        let frame = self.fetch(key)?;
        let out = f(&mut frame.write_data());
        self.pool.unpin_page(key, true);
        Ok(out)
    }

    /// Reads one slot of a page.
    pub fn read_slot(&self, key: &PageKey, slot: usize) -> Result<i64> {
        self.with_page(key, |p| p.read(slot))?
    }

    /// Overwrites one existing slot of a page.
    pub fn write_slot(&self, key: &PageKey, slot: usize, value: i64) -> Result<()> {
        self.with_page_mut(key, |p| p.overwrite(slot, value))?
    }

    /// Appends one value to a page, returning the slot index.
    pub fn append_slot(&self, key: &PageKey, value: i64) -> Result<usize> {
        self.with_page_mut(key, |p| p.append(value))?
    }

    /// Returns the slot count of a page.
    pub fn slot_count(&self, key: &PageKey) -> Result<usize> {
        self.with_page(key, |p| p.slot_count())
    }

    /// Writes every dirty resident page to disk. Returns pages flushed.
    pub fn flush_all(&self) -> Result<usize> {
        let flushed = self
            .pool
            .flush_all(|key, page| self.store.write_page(key, page))?;
        tracing::debug!(flushed, "flushed dirty pages");
        Ok(flushed)
    }

    /// Drops a table: discards its cached pages and removes its files.
    pub fn drop_table(&self, table: &str) -> Result<()> {
        self.pool.delete_pages_for(table);
        self.store.remove_table(table)
    }
}
