//! Rebuilding a table from its on-disk pages.
//!
//! Nothing but the page files and the catalog row is needed: the page
//! directory is rebuilt by scanning page groups, RID counters resume past
//! the largest RID seen, and the primary-key index is rebuilt from live base
//! records. Slot-count skew between columns of one page group (a partial
//! write during a crash) is resolved by intersecting to the shortest column.

use crate::cache::PageCache;
use crate::table::{ColumnLocation, RecordLocation, Table};
use lstore_common::layout::{Rid, BASE_RID_START, META_COLUMNS, RID_COLUMN, TAIL_RID_START};
use lstore_common::page::{PageKey, PageTier, PAGE_CAPACITY};
use lstore_common::Result;
use std::collections::HashSet;
use std::sync::Arc;

impl Table {
    /// Recovers a table from disk given its catalog row.
    ///
    /// A corrupt or missing column page truncates its page group to the
    /// empty prefix with a warning; it never prevents opening.
    pub fn recover(
        name: impl Into<String>,
        num_columns: usize,
        key_index: usize,
        deleted: HashSet<Rid>,
        cache: Arc<PageCache>,
    ) -> Result<Self> {
        let mut table = Table::new(name, num_columns, key_index, cache)?;
        table.deleted = deleted;

        let mut max_base = BASE_RID_START - 1;
        let mut max_tail = TAIL_RID_START - 1;

        for tier in [PageTier::Base, PageTier::Tail] {
            let groups = table.cache.store().scan_tier(&table.name, tier)?;
            let mut cursor = 0;

            for (&page_num, columns) in &groups {
                let count = table.consistent_slot_count(tier, page_num, columns);

                // Truncate longer columns to the agreed count so later
                // appends land on the same slot in every column
                for &col in columns {
                    let key = PageKey::new(table.name.clone(), col, page_num, tier);
                    if let Ok(n) = table.cache.slot_count(&key) {
                        if n > count {
                            table.cache.with_page_mut(&key, |p| p.truncate(count))?;
                        }
                    }
                }

                for slot in 0..count {
                    let rid_key =
                        PageKey::new(table.name.clone(), RID_COLUMN, page_num, tier);
                    let rid = Rid(table.cache.read_slot(&rid_key, slot)?);

                    match tier {
                        PageTier::Base => max_base = max_base.max(rid.as_i64()),
                        PageTier::Tail => max_tail = max_tail.max(rid.as_i64()),
                    }

                    table.page_directory.insert(
                        rid,
                        RecordLocation {
                            tier,
                            columns: (0..table.total_columns())
                                .map(|_| ColumnLocation { page_num, slot })
                                .collect(),
                        },
                    );
                }
                cursor = page_num * PAGE_CAPACITY + count;
            }

            match tier {
                PageTier::Base => table.base_records = cursor,
                PageTier::Tail => table.tail_records = cursor,
            }
        }

        table.next_base_rid = max_base + 1;
        table.next_tail_rid = max_tail + 1;

        table.rebuild_pk_index()?;

        tracing::info!(
            table = %table.name,
            base_records = table.base_records,
            tail_records = table.tail_records,
            "table recovered"
        );
        Ok(table)
    }

    /// Minimum slot count across all physical columns of one page group.
    ///
    /// A missing or unreadable column page empties the whole group: only
    /// slots present in every column describe complete records.
    fn consistent_slot_count(
        &self,
        tier: PageTier,
        page_num: usize,
        columns_present: &[usize],
    ) -> usize {
        let mut min_count = usize::MAX;

        for col in 0..self.total_columns() {
            if !columns_present.contains(&col) {
                tracing::warn!(
                    table = %self.name,
                    %tier,
                    page_num,
                    column = col,
                    "column page missing, truncating page group"
                );
                return 0;
            }
            let key = PageKey::new(self.name.clone(), col, page_num, tier);
            match self.cache.slot_count(&key) {
                Ok(count) => min_count = min_count.min(count),
                Err(e) => {
                    tracing::warn!(
                        table = %self.name,
                        %tier,
                        page_num,
                        column = col,
                        error = %e,
                        "unreadable column page, truncating page group"
                    );
                    return 0;
                }
            }
        }

        if min_count == usize::MAX {
            0
        } else {
            min_count
        }
    }

    /// Rebuilds the primary-key index from live base records.
    ///
    /// The key column is immutable, so the base cell always holds the
    /// current key value.
    fn rebuild_pk_index(&mut self) -> Result<()> {
        let mut entries = Vec::new();
        for (&rid, _) in self.page_directory.iter() {
            if rid.is_base() && !self.deleted.contains(&rid) {
                let key = self.read_cell(rid, META_COLUMNS + self.key_index)?;
                entries.push((key, rid));
            }
        }

        for (key, rid) in entries {
            if let Err(e) = self.index.insert_key(key, rid) {
                tracing::warn!(
                    table = %self.name,
                    key,
                    rid = %rid,
                    error = %e,
                    "skipping key during index rebuild"
                );
            }
        }
        Ok(())
    }
}
