//! Page-file I/O rooted at a data directory.
//!
//! On-disk layout:
//!
//! ```text
//! <DATA_DIR>/
//!   metadata.json
//!   <table>/
//!     base/col_<i>_page_<n>.page.json
//!     tail/col_<i>_page_<n>.page.json
//! ```

use lstore_common::page::{ColumnPage, PageKey, PageTier};
use lstore_common::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Reads and writes column pages as one file per page.
#[derive(Debug)]
pub struct PageStore {
    /// Base directory for data files.
    data_dir: PathBuf,
}

impl PageStore {
    /// Creates a page store rooted at the given directory, creating it if
    /// necessary.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding one tier of a table.
    fn tier_dir(&self, table: &str, tier: PageTier) -> PathBuf {
        self.data_dir.join(table).join(tier.dir_name())
    }

    /// Full path of a page file.
    fn page_path(&self, key: &PageKey) -> PathBuf {
        self.tier_dir(&key.table, key.tier).join(key.file_name())
    }

    /// Returns true if the page file exists on disk.
    pub fn page_exists(&self, key: &PageKey) -> bool {
        self.page_path(key).is_file()
    }

    /// Reads a page from disk.
    ///
    /// Missing files surface as `Io`; malformed contents as `CorruptPage`.
    pub fn read_page(&self, key: &PageKey) -> Result<ColumnPage> {
        let data = std::fs::read_to_string(self.page_path(key))?;
        ColumnPage::from_json(&data, &key.to_string())
    }

    /// Writes a page to disk, creating parent directories lazily.
    pub fn write_page(&self, key: &PageKey, page: &ColumnPage) -> Result<()> {
        let path = self.page_path(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, page.to_json()?)?;
        Ok(())
    }

    /// Enumerates the page files of one tier of a table.
    ///
    /// Returns `page_num -> sorted column indices present`, ordered by page
    /// number. A missing tier directory yields an empty map. Files that do
    /// not look like page files are ignored.
    pub fn scan_tier(&self, table: &str, tier: PageTier) -> Result<BTreeMap<usize, Vec<usize>>> {
        let dir = self.tier_dir(table, tier);
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();

        if !dir.is_dir() {
            return Ok(groups);
        }

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some((column, page_num)) = PageKey::parse_file_name(name) {
                groups.entry(page_num).or_default().push(column);
            }
        }

        for columns in groups.values_mut() {
            columns.sort_unstable();
        }
        Ok(groups)
    }

    /// Removes a table's directory tree.
    pub fn remove_table(&self, table: &str) -> Result<()> {
        let dir = self.data_dir.join(table);
        if dir.is_dir() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_store() -> (PageStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path()).unwrap();
        (store, dir)
    }

    fn page_with(values: &[i64]) -> ColumnPage {
        let mut page = ColumnPage::default();
        for &v in values {
            page.append(v).unwrap();
        }
        page
    }

    #[test]
    fn test_store_new_creates_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = PageStore::new(&nested).unwrap();
        assert!(store.data_dir().is_dir());
    }

    #[test]
    fn test_store_write_read_roundtrip() {
        let (store, _dir) = create_test_store();
        let key = PageKey::new("grades", 4, 0, PageTier::Base);

        store.write_page(&key, &page_with(&[1, -2, 3])).unwrap();
        assert!(store.page_exists(&key));

        let page = store.read_page(&key).unwrap();
        assert_eq!(page.slot_count(), 3);
        assert_eq!(page.read(1).unwrap(), -2);
    }

    #[test]
    fn test_store_read_missing_page() {
        let (store, _dir) = create_test_store();
        let key = PageKey::new("grades", 0, 0, PageTier::Base);

        let err = store.read_page(&key).unwrap_err();
        assert!(matches!(err, lstore_common::LstoreError::Io(_)));
    }

    #[test]
    fn test_store_overwrite_page() {
        let (store, _dir) = create_test_store();
        let key = PageKey::new("grades", 0, 0, PageTier::Tail);

        store.write_page(&key, &page_with(&[1])).unwrap();
        store.write_page(&key, &page_with(&[1, 2])).unwrap();

        assert_eq!(store.read_page(&key).unwrap().slot_count(), 2);
    }

    #[test]
    fn test_store_layout_paths() {
        let (store, dir) = create_test_store();
        let key = PageKey::new("grades", 2, 5, PageTier::Tail);

        store.write_page(&key, &page_with(&[7])).unwrap();

        let expected = dir
            .path()
            .join("grades")
            .join("tail")
            .join("col_2_page_5.page.json");
        assert!(expected.is_file());
    }

    #[test]
    fn test_store_scan_tier() {
        let (store, _dir) = create_test_store();

        for col in 0..3 {
            store
                .write_page(&PageKey::new("t", col, 0, PageTier::Base), &page_with(&[1]))
                .unwrap();
        }
        store
            .write_page(&PageKey::new("t", 0, 1, PageTier::Base), &page_with(&[2]))
            .unwrap();

        let groups = store.scan_tier("t", PageTier::Base).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&0], vec![0, 1, 2]);
        assert_eq!(groups[&1], vec![0]);

        // Tail tier untouched
        assert!(store.scan_tier("t", PageTier::Tail).unwrap().is_empty());
    }

    #[test]
    fn test_store_scan_missing_table() {
        let (store, _dir) = create_test_store();
        assert!(store.scan_tier("nope", PageTier::Base).unwrap().is_empty());
    }

    #[test]
    fn test_store_scan_ignores_foreign_files() {
        let (store, dir) = create_test_store();

        store
            .write_page(&PageKey::new("t", 0, 0, PageTier::Base), &page_with(&[1]))
            .unwrap();
        std::fs::write(
            dir.path().join("t").join("base").join("notes.txt"),
            "not a page",
        )
        .unwrap();

        let groups = store.scan_tier("t", PageTier::Base).unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_store_corrupt_page() {
        let (store, dir) = create_test_store();
        let key = PageKey::new("t", 0, 0, PageTier::Base);

        let path = dir
            .path()
            .join("t")
            .join("base")
            .join("col_0_page_0.page.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{garbage").unwrap();

        let err = store.read_page(&key).unwrap_err();
        assert!(matches!(err, lstore_common::LstoreError::CorruptPage { .. }));
    }

    #[test]
    fn test_store_remove_table() {
        let (store, dir) = create_test_store();

        store
            .write_page(&PageKey::new("t", 0, 0, PageTier::Base), &page_with(&[1]))
            .unwrap();
        assert!(dir.path().join("t").is_dir());

        store.remove_table("t").unwrap();
        assert!(!dir.path().join("t").exists());

        // Removing a missing table is a no-op
        store.remove_table("t").unwrap();
    }
}
