//! Merge compaction: fold the newest version of every live record back into
//! its base pages.
//!
//! Merge is destructive to version history. After it runs, each merged
//! base's indirection points back at itself and its schema is cleared, so
//! versioned reads at any depth return the merged row. The tail records stay
//! on disk but are no longer referenced by any chain.

use crate::composer::VersionComposer;
use crate::table::Table;
use lstore_common::layout::{INDIRECTION_COLUMN, META_COLUMNS, SCHEMA_ENCODING_COLUMN};
use lstore_common::Result;

impl Table {
    /// Compacts every live, updated record into its base pages.
    ///
    /// Returns the number of records rewritten.
    pub fn merge(&mut self) -> Result<usize> {
        let projection = vec![true; self.num_columns()];
        let mut merged = 0;

        for rid in self.live_rids() {
            let head = self.read_cell(rid, INDIRECTION_COLUMN)?;
            if head == rid.as_i64() {
                // Never updated (or already merged)
                continue;
            }

            let row = VersionComposer::new(self).compose(rid, &projection, 0)?;
            for (col, &value) in row.iter().enumerate() {
                self.write_cell(rid, META_COLUMNS + col, value)?;
            }
            self.write_cell(rid, INDIRECTION_COLUMN, rid.as_i64())?;
            self.write_cell(rid, SCHEMA_ENCODING_COLUMN, 0)?;
            merged += 1;
        }

        tracing::info!(table = %self.name(), merged, "merge complete");
        Ok(merged)
    }
}
