//! Versioned read composition.
//!
//! A record's versions are linked by the indirection chain: the base points
//! at the newest tail, each tail points at the previous version, and the
//! oldest tail points back at the base. Reconstruction walks the chain
//! newest to oldest, skips `version_index` tails, then overlays the
//! remaining tails under their schema bitmasks and falls back to the base
//! for columns no tail set.

use crate::table::Table;
use lstore_common::layout::{
    Rid, INDIRECTION_COLUMN, META_COLUMNS, SCHEMA_ENCODING_COLUMN,
};
use lstore_common::{LstoreError, Result};

/// Composes materialized rows from a base record and its tail chain.
pub(crate) struct VersionComposer<'a> {
    table: &'a Table,
}

impl<'a> VersionComposer<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    /// Collects the tail chain of a base record, newest first.
    ///
    /// The walk stops when a pointer returns to the base RID. The chain is
    /// bounded by the table's tail count; exceeding it means a pointer cycle
    /// and surfaces as `BrokenIndirection`.
    fn collect_chain(&self, base_rid: Rid) -> Result<Vec<Rid>> {
        let mut chain = Vec::new();
        let mut cursor = self.table.read_cell(base_rid, INDIRECTION_COLUMN)?;
        let bound = self.table.tail_records + 1;

        while cursor != base_rid.as_i64() {
            if chain.len() >= bound {
                return Err(LstoreError::BrokenIndirection { rid: cursor });
            }
            let tail = Rid(cursor);
            chain.push(tail);
            cursor = self.table.read_cell(tail, INDIRECTION_COLUMN)?;
        }
        Ok(chain)
    }

    /// Materializes the projected columns of `base_rid` at `version_index`
    /// (0 = newest, clamped to the oldest recorded version).
    ///
    /// Returns the projected values in column order. Every returned value
    /// comes either from a tail whose schema bit for that column is set, or
    /// from the base record.
    pub fn compose(
        &self,
        base_rid: Rid,
        projection: &[bool],
        version_index: usize,
    ) -> Result<Vec<i64>> {
        debug_assert_eq!(projection.len(), self.table.num_columns());

        let mut need: Vec<usize> = projection
            .iter()
            .enumerate()
            .filter_map(|(col, &wanted)| wanted.then_some(col))
            .collect();
        let mut values = vec![0i64; self.table.num_columns()];
        let chain = self.collect_chain(base_rid)?;

        let skip = version_index.min(chain.len());
        for &tail in &chain[skip..] {
            if need.is_empty() {
                break;
            }
            let mask = self.table.read_cell(tail, SCHEMA_ENCODING_COLUMN)?;
            let mut remaining = Vec::with_capacity(need.len());
            for col in need {
                if mask & (1 << col) != 0 {
                    values[col] = self.table.read_cell(tail, META_COLUMNS + col)?;
                } else {
                    remaining.push(col);
                }
            }
            need = remaining;
        }

        // Whatever no tail set comes from the base record
        for col in need {
            values[col] = self.table.read_cell(base_rid, META_COLUMNS + col)?;
        }

        Ok(projection
            .iter()
            .enumerate()
            .filter_map(|(col, &wanted)| wanted.then_some(values[col]))
            .collect())
    }
}
