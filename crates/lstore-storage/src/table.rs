//! Tables: base/tail records, cumulative updates, and the indirection chain.

use crate::cache::PageCache;
use crate::composer::VersionComposer;
use crate::index::TableIndex;
use lstore_common::layout::{
    Rid, BASE_RID_START, INDIRECTION_COLUMN, META_COLUMNS, RID_COLUMN,
    SCHEMA_ENCODING_COLUMN, TAIL_RID_START, TIMESTAMP_COLUMN,
};
use lstore_common::page::{PageKey, PageTier, PAGE_CAPACITY};
use lstore_common::{LstoreError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Location of one physical column's cell: page number and slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLocation {
    pub page_num: usize,
    pub slot: usize,
}

/// Where a record lives: its tier plus one location per physical column.
///
/// All locations of one record share the same slot index; columns are
/// appended in lockstep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    pub tier: PageTier,
    pub columns: Vec<ColumnLocation>,
}

/// A materialized row returned from a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub rid: Rid,
    pub key: i64,
    pub columns: Vec<i64>,
}

/// One table: logical schema, page directory, RID counters, deleted set,
/// and indexes. All page access goes through the shared cache.
#[derive(Debug)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) num_columns: usize,
    pub(crate) key_index: usize,
    pub(crate) cache: Arc<PageCache>,
    /// RID -> per-column page locations.
    pub(crate) page_directory: HashMap<Rid, RecordLocation>,
    /// Tombstoned base RIDs; invisible to reads, chains preserved.
    pub(crate) deleted: HashSet<Rid>,
    pub(crate) index: TableIndex,
    pub(crate) next_base_rid: i64,
    pub(crate) next_tail_rid: i64,
    /// Records appended to the base tier (append cursor).
    pub(crate) base_records: usize,
    /// Records appended to the tail tier (append cursor).
    pub(crate) tail_records: usize,
    /// Last timestamp handed out; timestamps never go backwards.
    pub(crate) last_timestamp: i64,
}

impl Table {
    /// Creates an empty table.
    pub fn new(
        name: impl Into<String>,
        num_columns: usize,
        key_index: usize,
        cache: Arc<PageCache>,
    ) -> Result<Self> {
        if key_index >= num_columns {
            return Err(LstoreError::ColumnOutOfRange {
                column: key_index,
                num_columns,
            });
        }
        Ok(Self {
            name: name.into(),
            num_columns,
            key_index,
            cache,
            page_directory: HashMap::new(),
            deleted: HashSet::new(),
            index: TableIndex::new(num_columns, key_index),
            next_base_rid: BASE_RID_START,
            next_tail_rid: TAIL_RID_START,
            base_records: 0,
            tail_records: 0,
            last_timestamp: 0,
        })
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of user columns.
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Returns the user-column index of the primary key.
    pub fn key_index(&self) -> usize {
        self.key_index
    }

    /// Returns the number of physical columns (meta + user).
    pub fn total_columns(&self) -> usize {
        META_COLUMNS + self.num_columns
    }

    /// Returns true if the base RID has been tombstoned.
    pub fn is_deleted(&self, rid: Rid) -> bool {
        self.deleted.contains(&rid)
    }

    /// Returns the tombstoned RIDs, sorted. Used for catalog persistence.
    pub fn deleted_rids(&self) -> Vec<i64> {
        let mut rids: Vec<i64> = self.deleted.iter().map(|r| r.as_i64()).collect();
        rids.sort_unstable();
        rids
    }

    /// Hands out an epoch-millisecond timestamp, clamped so that timestamps
    /// are monotonically non-decreasing within this table.
    fn now_millis(&mut self) -> i64 {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let ts = wall.max(self.last_timestamp);
        self.last_timestamp = ts;
        ts
    }

    /// Appends one full physical record to a tier, column by column.
    ///
    /// Pages are allocated lazily when the append cursor crosses a page
    /// boundary. Returns the record's location.
    fn append_record(&mut self, tier: PageTier, values: &[i64]) -> Result<RecordLocation> {
        debug_assert_eq!(values.len(), self.total_columns());

        let cursor = match tier {
            PageTier::Base => self.base_records,
            PageTier::Tail => self.tail_records,
        };
        let page_num = cursor / PAGE_CAPACITY;
        let slot = cursor % PAGE_CAPACITY;

        let mut columns = Vec::with_capacity(values.len());
        for (col, &value) in values.iter().enumerate() {
            let key = PageKey::new(self.name.clone(), col, page_num, tier);
            if slot == 0 {
                self.cache.create_page(&key)?;
            }
            let written = self.cache.append_slot(&key, value)?;
            debug_assert_eq!(written, slot);
            columns.push(ColumnLocation { page_num, slot });
        }

        match tier {
            PageTier::Base => self.base_records += 1,
            PageTier::Tail => self.tail_records += 1,
        }
        Ok(RecordLocation { tier, columns })
    }

    /// Reads one physical cell of a record.
    pub(crate) fn read_cell(&self, rid: Rid, column: usize) -> Result<i64> {
        let loc = self
            .page_directory
            .get(&rid)
            .ok_or(LstoreError::BrokenIndirection { rid: rid.as_i64() })?;
        let cell = loc.columns[column];
        let key = PageKey::new(self.name.clone(), column, cell.page_num, loc.tier);
        self.cache.read_slot(&key, cell.slot)
    }

    /// Overwrites one physical cell of a record in place.
    ///
    /// Used for the base indirection repoint and the merge writeback.
    pub(crate) fn write_cell(&self, rid: Rid, column: usize, value: i64) -> Result<()> {
        let loc = self
            .page_directory
            .get(&rid)
            .ok_or(LstoreError::BrokenIndirection { rid: rid.as_i64() })?;
        let cell = loc.columns[column];
        let key = PageKey::new(self.name.clone(), column, cell.page_num, loc.tier);
        self.cache.write_slot(&key, cell.slot, value)
    }

    /// Inserts a new row. Rejects duplicate primary keys before any state
    /// changes.
    pub fn insert(&mut self, values: &[i64]) -> Result<Rid> {
        if values.len() != self.num_columns {
            return Err(LstoreError::ArityMismatch {
                expected: self.num_columns,
                actual: values.len(),
            });
        }

        let pk = values[self.key_index];
        if self.index.contains_key(pk) {
            return Err(LstoreError::DuplicateKey { key: pk });
        }

        let rid = Rid(self.next_base_rid);
        let ts = self.now_millis();

        let mut row = Vec::with_capacity(self.total_columns());
        row.extend_from_slice(&[rid.as_i64(), rid.as_i64(), ts, 0]);
        row.extend_from_slice(values);
        debug_assert_eq!(row[INDIRECTION_COLUMN], rid.as_i64());
        debug_assert_eq!(row[RID_COLUMN], rid.as_i64());
        debug_assert_eq!(row[TIMESTAMP_COLUMN], ts);
        debug_assert_eq!(row[SCHEMA_ENCODING_COLUMN], 0);

        let loc = self.append_record(PageTier::Base, &row)?;
        self.page_directory.insert(rid, loc);
        self.next_base_rid += 1;

        self.index.insert_key(pk, rid)?;
        for (col, &value) in values.iter().enumerate() {
            if col != self.key_index {
                self.index.insert_entry(col, value, rid);
            }
        }
        Ok(rid)
    }

    /// Updates the row with the given primary key.
    ///
    /// `None` cells mean "keep"; the key column must be `None`. Columns whose
    /// provided value equals the current value are not recorded; when nothing
    /// actually changes the update is a no-op and no tail is written.
    pub fn update(&mut self, key: i64, new_values: &[Option<i64>]) -> Result<()> {
        if new_values.len() != self.num_columns {
            return Err(LstoreError::ArityMismatch {
                expected: self.num_columns,
                actual: new_values.len(),
            });
        }
        if new_values[self.key_index].is_some() {
            return Err(LstoreError::KeyColumnImmutable);
        }

        let rid = self
            .index
            .locate_key(key)
            .filter(|r| !self.deleted.contains(r))
            .ok_or(LstoreError::RecordNotFound { key })?;

        let current =
            VersionComposer::new(self).compose(rid, &vec![true; self.num_columns], 0)?;

        let mut changed_mask: i64 = 0;
        for (col, value) in new_values.iter().enumerate() {
            if let Some(v) = value {
                if *v != current[col] {
                    changed_mask |= 1 << col;
                }
            }
        }
        if changed_mask == 0 {
            return Ok(());
        }

        let tail_rid = Rid(self.next_tail_rid);
        let prev_head = self.read_cell(rid, INDIRECTION_COLUMN)?;
        let ts = self.now_millis();

        let mut row = Vec::with_capacity(self.total_columns());
        row.extend_from_slice(&[prev_head, tail_rid.as_i64(), ts, changed_mask]);
        for (col, value) in new_values.iter().enumerate() {
            // Unchanged columns carry a placeholder; readers rely on the
            // schema bitmask, never on this value.
            if changed_mask & (1 << col) != 0 {
                row.push(value.unwrap_or(0));
            } else {
                row.push(0);
            }
        }

        let loc = self.append_record(PageTier::Tail, &row)?;
        self.page_directory.insert(tail_rid, loc);
        self.next_tail_rid += 1;

        // Repoint the base at the new chain head
        self.write_cell(rid, INDIRECTION_COLUMN, tail_rid.as_i64())?;

        for (col, value) in new_values.iter().enumerate() {
            if let Some(v) = value {
                if changed_mask & (1 << col) != 0 && col != self.key_index {
                    self.index.update_entry(col, current[col], *v, rid);
                }
            }
        }
        Ok(())
    }

    /// Tombstones the row with the given primary key.
    ///
    /// The record and its tail chain stay on disk; readers gate on the
    /// deleted set. All index entries are removed.
    pub fn delete(&mut self, key: i64) -> Result<Rid> {
        let rid = self
            .index
            .locate_key(key)
            .filter(|r| !self.deleted.contains(r))
            .ok_or(LstoreError::RecordNotFound { key })?;

        let current =
            VersionComposer::new(self).compose(rid, &vec![true; self.num_columns], 0)?;

        self.index.remove_key(key);
        for (col, &value) in current.iter().enumerate() {
            if col != self.key_index {
                self.index.remove_entry(col, value, rid);
            }
        }
        self.deleted.insert(rid);
        Ok(rid)
    }

    /// Reads a record version. `version_index` counts back from the newest
    /// (0); indexes beyond the history clamp to the original base row.
    ///
    /// Returns the projected columns' values in column order.
    pub fn read_version(
        &self,
        rid: Rid,
        projection: &[bool],
        version_index: usize,
    ) -> Result<Vec<i64>> {
        VersionComposer::new(self).compose(rid, projection, version_index)
    }

    /// Returns the primary-key value of a base record.
    pub fn primary_key_of(&self, rid: Rid) -> Result<i64> {
        self.read_cell(rid, META_COLUMNS + self.key_index)
    }

    /// Returns all live (not tombstoned) base RIDs, sorted.
    pub fn live_rids(&self) -> Vec<Rid> {
        let mut rids: Vec<Rid> = self
            .page_directory
            .keys()
            .filter(|r| r.is_base() && !self.deleted.contains(r))
            .copied()
            .collect();
        rids.sort_unstable();
        rids
    }

    /// Finds live base RIDs whose current value in `column` equals `value`.
    ///
    /// Uses the PK index for the key column and a secondary index when one
    /// exists; otherwise falls back to a scan of current versions.
    pub fn find_rids(&self, column: usize, value: i64) -> Result<Vec<Rid>> {
        if column >= self.num_columns {
            return Err(LstoreError::ColumnOutOfRange {
                column,
                num_columns: self.num_columns,
            });
        }

        if column == self.key_index || self.index.has_index(column) {
            return Ok(self
                .index
                .locate(column, value)
                .into_iter()
                .filter(|r| !self.deleted.contains(r))
                .collect());
        }

        let mut projection = vec![false; self.num_columns];
        projection[column] = true;
        let mut hits = Vec::new();
        for rid in self.live_rids() {
            let row = self.read_version(rid, &projection, 0)?;
            if row[0] == value {
                hits.push(rid);
            }
        }
        Ok(hits)
    }

    /// Sums `column` over live rows whose primary key falls in
    /// `[start_key, end_key]`, at the given version.
    ///
    /// Reports `RecordNotFound` when no live key falls in the range.
    pub fn sum_range(
        &self,
        start_key: i64,
        end_key: i64,
        column: usize,
        version_index: usize,
    ) -> Result<i64> {
        if column >= self.num_columns {
            return Err(LstoreError::ColumnOutOfRange {
                column,
                num_columns: self.num_columns,
            });
        }

        let mut projection = vec![false; self.num_columns];
        projection[column] = true;

        let mut total = 0i64;
        let mut matched = false;
        for rid in self.index.locate_key_range(start_key, end_key) {
            if self.deleted.contains(&rid) {
                continue;
            }
            total += self.read_version(rid, &projection, version_index)?[0];
            matched = true;
        }

        if !matched {
            return Err(LstoreError::RecordNotFound { key: start_key });
        }
        Ok(total)
    }

    /// Builds a secondary index over a column from current live values.
    pub fn create_index(&mut self, column: usize) -> Result<()> {
        if column >= self.num_columns {
            return Err(LstoreError::ColumnOutOfRange {
                column,
                num_columns: self.num_columns,
            });
        }
        if column == self.key_index {
            return Ok(());
        }

        let mut projection = vec![false; self.num_columns];
        projection[column] = true;
        let mut entries = Vec::new();
        for rid in self.live_rids() {
            let row = self.read_version(rid, &projection, 0)?;
            entries.push((row[0], rid));
        }

        self.index.create_index(column)?;
        for (value, rid) in entries {
            self.index.insert_entry(column, value, rid);
        }
        Ok(())
    }

    /// Releases the secondary index of a column.
    pub fn drop_index(&mut self, column: usize) {
        self.index.drop_index(column);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PageStore;
    use lstore_buffer::{BufferPool, BufferPoolConfig};
    use tempfile::tempdir;

    fn create_test_table(num_columns: usize, key_index: usize) -> (Table, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig { num_frames: 64 });
        let cache = Arc::new(PageCache::new(store, pool));
        let table = Table::new("grades", num_columns, key_index, cache).unwrap();
        (table, dir)
    }

    #[test]
    fn test_table_new_validates_key_index() {
        let dir = tempdir().unwrap();
        let store = PageStore::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default());
        let cache = Arc::new(PageCache::new(store, pool));

        let err = Table::new("t", 3, 3, cache).unwrap_err();
        assert!(matches!(err, LstoreError::ColumnOutOfRange { .. }));
    }

    #[test]
    fn test_insert_and_read_base() {
        let (mut table, _dir) = create_test_table(3, 0);

        let rid = table.insert(&[1, 10, 100]).unwrap();
        assert_eq!(rid, Rid(BASE_RID_START));

        // Meta columns of a fresh base record
        assert_eq!(table.read_cell(rid, INDIRECTION_COLUMN).unwrap(), rid.as_i64());
        assert_eq!(table.read_cell(rid, RID_COLUMN).unwrap(), rid.as_i64());
        assert_eq!(table.read_cell(rid, SCHEMA_ENCODING_COLUMN).unwrap(), 0);

        // User columns
        assert_eq!(table.read_cell(rid, META_COLUMNS).unwrap(), 1);
        assert_eq!(table.read_cell(rid, META_COLUMNS + 1).unwrap(), 10);
        assert_eq!(table.read_cell(rid, META_COLUMNS + 2).unwrap(), 100);
    }

    #[test]
    fn test_insert_duplicate_key() {
        let (mut table, _dir) = create_test_table(3, 0);

        table.insert(&[1, 10, 100]).unwrap();
        let err = table.insert(&[1, 99, 999]).unwrap_err();
        assert!(matches!(err, LstoreError::DuplicateKey { key: 1 }));

        // No state change observable
        assert_eq!(table.live_rids().len(), 1);
        let row = table.read_version(Rid(1), &[true, true, true], 0).unwrap();
        assert_eq!(row, vec![1, 10, 100]);
    }

    #[test]
    fn test_insert_arity_mismatch() {
        let (mut table, _dir) = create_test_table(3, 0);
        let err = table.insert(&[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            LstoreError::ArityMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_rids_increase_never_reused() {
        let (mut table, _dir) = create_test_table(2, 0);

        let r1 = table.insert(&[1, 0]).unwrap();
        let r2 = table.insert(&[2, 0]).unwrap();
        assert!(r2 > r1);

        table.update(1, &[None, Some(5)]).unwrap();
        table.update(2, &[None, Some(6)]).unwrap();
        assert_eq!(table.next_tail_rid, TAIL_RID_START + 2);

        // Deleting and reinserting does not reuse RIDs
        table.delete(1).unwrap();
        let r3 = table.insert(&[1, 7]).unwrap();
        assert!(r3 > r2);
    }

    #[test]
    fn test_update_writes_cumulative_tail() {
        let (mut table, _dir) = create_test_table(3, 0);

        let rid = table.insert(&[1, 10, 100]).unwrap();
        table.update(1, &[None, Some(20), None]).unwrap();

        // Base now points at the tail
        let head = Rid(table.read_cell(rid, INDIRECTION_COLUMN).unwrap());
        assert!(head.is_tail());

        // Tail points back at the base, carries the changed-column bitmask
        assert_eq!(table.read_cell(head, INDIRECTION_COLUMN).unwrap(), rid.as_i64());
        assert_eq!(table.read_cell(head, SCHEMA_ENCODING_COLUMN).unwrap(), 0b010);
        assert_eq!(table.read_cell(head, META_COLUMNS + 1).unwrap(), 20);
    }

    #[test]
    fn test_update_key_column_rejected() {
        let (mut table, _dir) = create_test_table(3, 0);
        table.insert(&[1, 10, 100]).unwrap();

        let err = table.update(1, &[Some(2), None, None]).unwrap_err();
        assert!(matches!(err, LstoreError::KeyColumnImmutable));

        // No tail was written
        assert_eq!(table.tail_records, 0);
    }

    #[test]
    fn test_update_missing_key() {
        let (mut table, _dir) = create_test_table(3, 0);
        let err = table.update(1, &[None, Some(5), None]).unwrap_err();
        assert!(matches!(err, LstoreError::RecordNotFound { key: 1 }));
    }

    #[test]
    fn test_update_no_change_is_noop() {
        let (mut table, _dir) = create_test_table(3, 0);
        table.insert(&[1, 10, 100]).unwrap();

        // Same values provided: nothing changes, no tail is appended
        table.update(1, &[None, Some(10), Some(100)]).unwrap();
        assert_eq!(table.tail_records, 0);

        let rid = Rid(1);
        assert_eq!(table.read_cell(rid, INDIRECTION_COLUMN).unwrap(), rid.as_i64());
    }

    #[test]
    fn test_delete_tombstones() {
        let (mut table, _dir) = create_test_table(3, 0);

        let rid = table.insert(&[1, 10, 100]).unwrap();
        table.update(1, &[None, Some(20), None]).unwrap();
        table.delete(1).unwrap();

        assert!(table.is_deleted(rid));
        assert!(table.live_rids().is_empty());
        assert_eq!(table.find_rids(0, 1).unwrap(), Vec::<Rid>::new());

        // Tail chain preserved on disk
        assert_eq!(table.tail_records, 1);

        let err = table.delete(1).unwrap_err();
        assert!(matches!(err, LstoreError::RecordNotFound { key: 1 }));
    }

    #[test]
    fn test_delete_then_reinsert_accepted() {
        let (mut table, _dir) = create_test_table(3, 0);

        let old = table.insert(&[1, 10, 100]).unwrap();
        table.delete(1).unwrap();

        let new = table.insert(&[1, 55, 555]).unwrap();
        assert_ne!(old, new);
        assert!(table.is_deleted(old));

        let rids = table.find_rids(0, 1).unwrap();
        assert_eq!(rids, vec![new]);
        let row = table.read_version(new, &[true, true, true], 0).unwrap();
        assert_eq!(row, vec![1, 55, 555]);
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 0]).unwrap();
        table.insert(&[2, 0]).unwrap();
        table.update(1, &[None, Some(9)]).unwrap();

        let t1 = table.read_cell(Rid(1), TIMESTAMP_COLUMN).unwrap();
        let t2 = table.read_cell(Rid(2), TIMESTAMP_COLUMN).unwrap();
        let t3 = table
            .read_cell(Rid(TAIL_RID_START), TIMESTAMP_COLUMN)
            .unwrap();
        assert!(t1 <= t2);
        assert!(t2 <= t3);
    }

    #[test]
    fn test_page_directory_entry_shape() {
        let (mut table, _dir) = create_test_table(3, 0);

        let rid = table.insert(&[1, 10, 100]).unwrap();
        let loc = &table.page_directory[&rid];

        assert_eq!(loc.tier, PageTier::Base);
        assert_eq!(loc.columns.len(), table.total_columns());
        let slot = loc.columns[0].slot;
        assert!(loc.columns.iter().all(|c| c.slot == slot));
    }

    #[test]
    fn test_append_spills_to_next_page() {
        let (mut table, _dir) = create_test_table(2, 0);

        for i in 0..(PAGE_CAPACITY as i64 + 3) {
            table.insert(&[i, i * 2]).unwrap();
        }

        let first = &table.page_directory[&Rid(1)];
        assert_eq!(first.columns[0].page_num, 0);

        let spilled = &table.page_directory[&Rid(PAGE_CAPACITY as i64 + 1)];
        assert_eq!(spilled.columns[0].page_num, 1);
        assert_eq!(spilled.columns[0].slot, 0);

        // Both pages readable
        let row = table
            .read_version(Rid(PAGE_CAPACITY as i64 + 2), &[true, true], 0)
            .unwrap();
        assert_eq!(row, vec![PAGE_CAPACITY as i64 + 1, (PAGE_CAPACITY as i64 + 1) * 2]);
    }

    #[test]
    fn test_sum_range() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 5]).unwrap();
        table.insert(&[2, 7]).unwrap();
        table.insert(&[3, 11]).unwrap();

        assert_eq!(table.sum_range(1, 3, 1, 0).unwrap(), 23);
        assert_eq!(table.sum_range(2, 2, 1, 0).unwrap(), 7);

        let err = table.sum_range(50, 60, 1, 0).unwrap_err();
        assert!(matches!(err, LstoreError::RecordNotFound { .. }));
    }

    #[test]
    fn test_sum_range_excludes_deleted() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 5]).unwrap();
        table.insert(&[2, 7]).unwrap();
        table.delete(2).unwrap();

        assert_eq!(table.sum_range(1, 2, 1, 0).unwrap(), 5);
    }

    #[test]
    fn test_find_rids_scan_without_index() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 7]).unwrap();
        table.insert(&[2, 7]).unwrap();
        table.insert(&[3, 8]).unwrap();

        assert_eq!(table.find_rids(1, 7).unwrap(), vec![Rid(1), Rid(2)]);
        assert_eq!(table.find_rids(1, 9).unwrap(), Vec::<Rid>::new());
    }

    #[test]
    fn test_find_rids_uses_secondary_index() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 7]).unwrap();
        table.insert(&[2, 7]).unwrap();
        table.create_index(1).unwrap();

        assert_eq!(table.find_rids(1, 7).unwrap(), vec![Rid(1), Rid(2)]);

        // Index maintained on update
        table.update(1, &[None, Some(9)]).unwrap();
        assert_eq!(table.find_rids(1, 7).unwrap(), vec![Rid(2)]);
        assert_eq!(table.find_rids(1, 9).unwrap(), vec![Rid(1)]);
    }

    #[test]
    fn test_secondary_index_respects_delete() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 7]).unwrap();
        table.create_index(1).unwrap();
        table.delete(1).unwrap();

        assert_eq!(table.find_rids(1, 7).unwrap(), Vec::<Rid>::new());
    }

    #[test]
    fn test_drop_index_falls_back_to_scan() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 7]).unwrap();
        table.insert(&[2, 8]).unwrap();
        table.create_index(1).unwrap();
        table.drop_index(1);

        // Same answers, now via the scan path
        assert_eq!(table.find_rids(1, 8).unwrap(), vec![Rid(2)]);
    }

    #[test]
    fn test_create_index_skips_deleted() {
        let (mut table, _dir) = create_test_table(2, 0);

        table.insert(&[1, 7]).unwrap();
        table.insert(&[2, 7]).unwrap();
        table.delete(1).unwrap();
        table.create_index(1).unwrap();

        assert_eq!(table.find_rids(1, 7).unwrap(), vec![Rid(2)]);
    }
}
