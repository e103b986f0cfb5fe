//! Configuration structures for the L-Store engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration for the database engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for data files.
    pub data_dir: PathBuf,
    /// Buffer pool size in number of page frames.
    pub buffer_pool_frames: usize,
    /// Flush dirty pages on `Database::close`.
    pub flush_on_close: bool,
    /// Run a compacting merge on `Database::close`. Merge collapses version
    /// history, so versioned reads across a restart require this to stay off.
    pub merge_on_close: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            buffer_pool_frames: 64,
            flush_on_close: true,
            merge_on_close: false,
        }
    }
}

impl StorageConfig {
    /// Creates a config rooted at the given data directory.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }
}
