//! Query facade over one table.
//!
//! This is the surface a test harness drives. Selects return materialized
//! [`Record`] values; updates use `None` cells for "keep this column".
//! Relative versions follow the convention `0` = newest, `-k` = k versions
//! back, clamping to the originally inserted row beyond recorded history.

use lstore_common::Result;
use lstore_storage::{Record, Table};

/// Executes point queries against a single table.
pub struct Query<'a> {
    table: &'a mut Table,
}

impl<'a> Query<'a> {
    /// Creates a query object bound to a table.
    pub fn new(table: &'a mut Table) -> Self {
        Self { table }
    }

    /// Normalizes a relative version (`0`, `-1`, `-2`, …) to a skip count.
    fn version_index(relative_version: i64) -> usize {
        (-relative_version).max(0) as usize
    }

    /// Inserts a row.
    pub fn insert(&mut self, values: &[i64]) -> Result<()> {
        self.table.insert(values).map(|_| ())
    }

    /// Reads the newest version of the records matching `search_key` in
    /// `search_column`, projected to the selected columns.
    ///
    /// Returns an empty list when no record matches.
    pub fn select(
        &self,
        search_key: i64,
        search_column: usize,
        projection: &[bool],
    ) -> Result<Vec<Record>> {
        self.select_version(search_key, search_column, projection, 0)
    }

    /// Reads an older version of the matching records.
    pub fn select_version(
        &self,
        search_key: i64,
        search_column: usize,
        projection: &[bool],
        relative_version: i64,
    ) -> Result<Vec<Record>> {
        let version = Self::version_index(relative_version);

        let mut records = Vec::new();
        for rid in self.table.find_rids(search_column, search_key)? {
            let columns = self.table.read_version(rid, projection, version)?;
            records.push(Record {
                rid,
                key: self.table.primary_key_of(rid)?,
                columns,
            });
        }
        Ok(records)
    }

    /// Updates the row with the given primary key. `None` cells are kept;
    /// the key column must be `None`.
    pub fn update(&mut self, key: i64, values: &[Option<i64>]) -> Result<()> {
        self.table.update(key, values)
    }

    /// Deletes the row with the given primary key.
    pub fn delete(&mut self, key: i64) -> Result<()> {
        self.table.delete(key).map(|_| ())
    }

    /// Sums `column` over the newest versions of rows with primary keys in
    /// `[start_key, end_key]`.
    pub fn sum(&self, start_key: i64, end_key: i64, column: usize) -> Result<i64> {
        self.table.sum_range(start_key, end_key, column, 0)
    }

    /// Sums `column` at an older version of each row in the key range.
    pub fn sum_version(
        &self,
        start_key: i64,
        end_key: i64,
        column: usize,
        relative_version: i64,
    ) -> Result<i64> {
        self.table
            .sum_range(start_key, end_key, column, Self::version_index(relative_version))
    }

    /// Adds one to a single column of the row with the given primary key.
    pub fn increment(&mut self, key: i64, column: usize) -> Result<()> {
        if column >= self.table.num_columns() {
            return Err(lstore_common::LstoreError::ColumnOutOfRange {
                column,
                num_columns: self.table.num_columns(),
            });
        }
        let mut projection = vec![false; self.table.num_columns()];
        projection[column] = true;

        let records = self.select(key, self.table.key_index(), &projection)?;
        let current = records
            .first()
            .ok_or(lstore_common::LstoreError::RecordNotFound { key })?
            .columns[0];

        let mut values = vec![None; self.table.num_columns()];
        values[column] = Some(current + 1);
        self.update(key, &values)
    }
}
