//! Per-column value indexes.
//!
//! The primary-key index is always present and maps each key value to a
//! single base RID; uniqueness is enforced at insert. Secondary indexes are
//! optional per user column and map a value to the set of base RIDs whose
//! current version carries it.

use lstore_common::layout::Rid;
use lstore_common::{LstoreError, Result};
use std::collections::{HashMap, HashSet};

/// Index set for one table.
#[derive(Debug)]
pub struct TableIndex {
    /// User-column index of the primary key.
    key_column: usize,
    /// Primary key: value -> base RID, bijective over live records.
    pk: HashMap<i64, Rid>,
    /// Optional secondary indexes, one slot per user column.
    secondary: Vec<Option<HashMap<i64, HashSet<Rid>>>>,
}

impl TableIndex {
    /// Creates the index set with only the primary-key index.
    pub fn new(num_columns: usize, key_column: usize) -> Self {
        Self {
            key_column,
            pk: HashMap::new(),
            secondary: (0..num_columns).map(|_| None).collect(),
        }
    }

    /// Returns the primary-key column index.
    pub fn key_column(&self) -> usize {
        self.key_column
    }

    /// Returns true if the key value is present.
    pub fn contains_key(&self, value: i64) -> bool {
        self.pk.contains_key(&value)
    }

    /// Looks up the base RID for a key value.
    pub fn locate_key(&self, value: i64) -> Option<Rid> {
        self.pk.get(&value).copied()
    }

    /// Registers a key value. Rejects duplicates.
    pub fn insert_key(&mut self, value: i64, rid: Rid) -> Result<()> {
        if self.pk.contains_key(&value) {
            return Err(LstoreError::DuplicateKey { key: value });
        }
        self.pk.insert(value, rid);
        Ok(())
    }

    /// Removes a key value, returning its RID if present.
    pub fn remove_key(&mut self, value: i64) -> Option<Rid> {
        self.pk.remove(&value)
    }

    /// Returns the RIDs of all keys in `[lo, hi]`, ordered by key value.
    pub fn locate_key_range(&self, lo: i64, hi: i64) -> Vec<Rid> {
        let mut hits: Vec<(i64, Rid)> = self
            .pk
            .iter()
            .filter(|(&k, _)| lo <= k && k <= hi)
            .map(|(&k, &rid)| (k, rid))
            .collect();
        hits.sort_unstable_by_key(|&(k, _)| k);
        hits.into_iter().map(|(_, rid)| rid).collect()
    }

    /// Returns true if the column has an index (the key column always does).
    pub fn has_index(&self, column: usize) -> bool {
        column == self.key_column
            || self
                .secondary
                .get(column)
                .map(|s| s.is_some())
                .unwrap_or(false)
    }

    /// Creates an empty secondary index for a column.
    ///
    /// The caller populates it with `insert_entry`; creating the key-column
    /// index is a no-op since it always exists.
    pub fn create_index(&mut self, column: usize) -> Result<()> {
        if column == self.key_column {
            return Ok(());
        }
        let num_columns = self.secondary.len();
        match self.secondary.get_mut(column) {
            Some(slot) => {
                if slot.is_none() {
                    *slot = Some(HashMap::new());
                }
                Ok(())
            }
            None => Err(LstoreError::ColumnOutOfRange {
                column,
                num_columns,
            }),
        }
    }

    /// Releases the secondary index of a column.
    pub fn drop_index(&mut self, column: usize) {
        if let Some(slot) = self.secondary.get_mut(column) {
            *slot = None;
        }
    }

    /// Adds a value entry to a column's secondary index, if one exists.
    pub fn insert_entry(&mut self, column: usize, value: i64, rid: Rid) {
        if let Some(Some(map)) = self.secondary.get_mut(column) {
            map.entry(value).or_default().insert(rid);
        }
    }

    /// Removes a value entry from a column's secondary index, if one exists.
    pub fn remove_entry(&mut self, column: usize, value: i64, rid: Rid) {
        if let Some(Some(map)) = self.secondary.get_mut(column) {
            if let Some(set) = map.get_mut(&value) {
                set.remove(&rid);
                if set.is_empty() {
                    map.remove(&value);
                }
            }
        }
    }

    /// Moves a RID from an old value to a new value in a secondary index.
    pub fn update_entry(&mut self, column: usize, old: i64, new: i64, rid: Rid) {
        self.remove_entry(column, old, rid);
        self.insert_entry(column, new, rid);
    }

    /// Returns the base RIDs carrying `value` in `column`, sorted.
    ///
    /// For the key column this is the PK lookup; for other columns it
    /// requires a secondary index and returns empty otherwise.
    pub fn locate(&self, column: usize, value: i64) -> Vec<Rid> {
        if column == self.key_column {
            return self.locate_key(value).into_iter().collect();
        }
        match self.secondary.get(column) {
            Some(Some(map)) => {
                let mut rids: Vec<Rid> = map
                    .get(&value)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default();
                rids.sort_unstable();
                rids
            }
            _ => Vec::new(),
        }
    }

    /// Returns the base RIDs with `column` values in `[lo, hi]`, sorted.
    pub fn locate_range(&self, column: usize, lo: i64, hi: i64) -> Vec<Rid> {
        if column == self.key_column {
            return self.locate_key_range(lo, hi);
        }
        match self.secondary.get(column) {
            Some(Some(map)) => {
                let mut rids: Vec<Rid> = map
                    .iter()
                    .filter(|(&v, _)| lo <= v && v <= hi)
                    .flat_map(|(_, set)| set.iter().copied())
                    .collect();
                rids.sort_unstable();
                rids.dedup();
                rids
            }
            _ => Vec::new(),
        }
    }
}
