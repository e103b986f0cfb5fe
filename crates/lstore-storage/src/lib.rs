//! Storage engine for L-Store tables.
//!
//! This crate provides:
//! - Page-file I/O rooted at a data directory
//! - A page cache routing all page access through the buffer pool
//! - Per-column value indexes with a mandatory primary-key index
//! - Tables with base/tail records, cumulative tail updates, and an
//!   indirection chain linking versions
//! - The version composer for time-travel reads
//! - Merge compaction and recovery from on-disk pages

mod cache;
mod composer;
mod index;
mod merge;
mod recovery;
mod store;
mod table;

pub use cache::PageCache;
pub use index::TableIndex;
pub use store::PageStore;
pub use table::{ColumnLocation, Record, RecordLocation, Table};
