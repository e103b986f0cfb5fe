//! Database lifecycle: catalog, open/close, and metadata persistence.

use lstore_buffer::{BufferPool, BufferPoolConfig};
use lstore_common::layout::Rid;
use lstore_common::{LstoreError, Result, StorageConfig};
use lstore_storage::{PageCache, PageStore, Table};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Catalog file name under the data directory.
const METADATA_FILE: &str = "metadata.json";

/// One catalog row in `metadata.json`.
#[derive(Debug, Serialize, Deserialize)]
struct TableMeta {
    name: String,
    num_columns: usize,
    key_index: usize,
    /// Tombstoned base RIDs, so deletes survive a restart.
    #[serde(default)]
    deleted_rids: Vec<i64>,
}

/// A database: one data directory, one shared page cache, a table catalog.
pub struct Database {
    config: StorageConfig,
    cache: Arc<PageCache>,
    tables: HashMap<String, Table>,
}

impl Database {
    /// Opens the database rooted at `path` with default settings, recovering
    /// any tables recorded in the catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(StorageConfig::at(path))
    }

    /// Opens a database with explicit configuration.
    pub fn open_with(config: StorageConfig) -> Result<Self> {
        let store = PageStore::new(&config.data_dir)?;
        let pool = BufferPool::new(BufferPoolConfig {
            num_frames: config.buffer_pool_frames,
        });
        let cache = Arc::new(PageCache::new(store, pool));

        let mut tables = HashMap::new();
        let meta_path = config.data_dir.join(METADATA_FILE);
        if meta_path.is_file() {
            let raw = std::fs::read_to_string(&meta_path)?;
            let metas: Vec<TableMeta> = serde_json::from_str(&raw)
                .map_err(|e| LstoreError::Metadata(format!("bad {METADATA_FILE}: {e}")))?;

            for meta in metas {
                let deleted: HashSet<Rid> =
                    meta.deleted_rids.iter().map(|&r| Rid(r)).collect();
                let table = Table::recover(
                    meta.name.clone(),
                    meta.num_columns,
                    meta.key_index,
                    deleted,
                    cache.clone(),
                )?;
                tables.insert(meta.name, table);
            }
        }

        tracing::info!(
            data_dir = %config.data_dir.display(),
            tables = tables.len(),
            "database opened"
        );
        Ok(Self {
            config,
            cache,
            tables,
        })
    }

    /// Creates a new table.
    pub fn create_table(
        &mut self,
        name: impl Into<String>,
        num_columns: usize,
        key_index: usize,
    ) -> Result<&mut Table> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(LstoreError::TableAlreadyExists(name));
        }

        let table = Table::new(name.clone(), num_columns, key_index, self.cache.clone())?;
        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Returns the table with the given name.
    pub fn get_table(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| LstoreError::TableNotFound(name.to_string()))
    }

    /// Drops a table: removes it from the catalog, discards its cached
    /// pages, and deletes its files.
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        if self.tables.remove(name).is_none() {
            return Err(LstoreError::TableNotFound(name.to_string()));
        }
        self.cache.drop_table(name)
    }

    /// Returns the table names in the catalog, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Closes the database: optionally merges, flushes dirty pages, and
    /// writes the catalog. The engine is durable only after this succeeds.
    pub fn close(mut self) -> Result<()> {
        if self.config.merge_on_close {
            for table in self.tables.values_mut() {
                table.merge()?;
            }
        }
        if self.config.flush_on_close {
            self.cache.flush_all()?;
        }

        let mut metas: Vec<TableMeta> = self
            .tables
            .values()
            .map(|t| TableMeta {
                name: t.name().to_string(),
                num_columns: t.num_columns(),
                key_index: t.key_index(),
                deleted_rids: t.deleted_rids(),
            })
            .collect();
        metas.sort_by(|a, b| a.name.cmp(&b.name));

        let raw = serde_json::to_string_pretty(&metas)
            .map_err(|e| LstoreError::Metadata(format!("cannot encode catalog: {e}")))?;
        std::fs::write(self.config.data_dir.join(METADATA_FILE), raw)?;

        tracing::info!(tables = self.tables.len(), "database closed");
        Ok(())
    }
}
