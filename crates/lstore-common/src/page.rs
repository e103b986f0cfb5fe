//! Page structures for L-Store columnar storage.
//!
//! One page stores one column of one table for one page number, tagged base
//! or tail. Pages hold fixed-width signed integers and are append-only;
//! existing slots are overwritten only by the merge writeback.

use crate::error::{LstoreError, Result};
use serde::{Deserialize, Serialize};

/// Number of integer slots per column page.
pub const PAGE_CAPACITY: usize = 512;

/// File extension for serialized pages.
pub const PAGE_FILE_SUFFIX: &str = ".page.json";

/// Whether a page belongs to the read-optimized base or the append-only tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageTier {
    Base,
    Tail,
}

impl PageTier {
    /// Directory name under the table directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            PageTier::Base => "base",
            PageTier::Tail => "tail",
        }
    }
}

impl std::fmt::Display for PageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Structured identity of a column page.
///
/// Encodes `(table, column_index, page_number, tier)`. The column index is a
/// physical index: meta columns first, then user columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageKey {
    /// Owning table name.
    pub table: String,
    /// Physical column index (meta columns included).
    pub column: usize,
    /// Page number within the column, 0-indexed.
    pub page_num: usize,
    /// Base or tail.
    pub tier: PageTier,
}

impl PageKey {
    /// Creates a new page key.
    pub fn new(table: impl Into<String>, column: usize, page_num: usize, tier: PageTier) -> Self {
        Self {
            table: table.into(),
            column,
            page_num,
            tier,
        }
    }

    /// File name of this page under `<table>/<tier>/`.
    pub fn file_name(&self) -> String {
        format!("col_{}_page_{}{}", self.column, self.page_num, PAGE_FILE_SUFFIX)
    }

    /// Parses a page file name back into `(column, page_num)`.
    ///
    /// Returns None for names that are not well-formed page files.
    pub fn parse_file_name(name: &str) -> Option<(usize, usize)> {
        let stem = name.strip_suffix(PAGE_FILE_SUFFIX)?;
        let rest = stem.strip_prefix("col_")?;
        let (column, page_num) = rest.split_once("_page_")?;
        Some((column.parse().ok()?, page_num.parse().ok()?))
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.table, self.column, self.page_num, self.tier
        )
    }
}

/// On-disk page representation: `{slot_count, slots}`.
#[derive(Serialize, Deserialize)]
struct PageFile {
    slot_count: usize,
    slots: Vec<i64>,
}

/// Fixed-capacity slotted container of signed integers.
///
/// Slots are only appended; `overwrite` exists for the merge writeback on
/// base pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPage {
    slots: Vec<i64>,
    capacity: usize,
}

impl Default for ColumnPage {
    fn default() -> Self {
        Self::new(PAGE_CAPACITY)
    }
}

impl ColumnPage {
    /// Creates an empty page with the given slot capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    /// Returns the number of slots written.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slot capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if at least one more slot can be appended.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.slots.len() < self.capacity
    }

    /// Appends one value and returns its slot index.
    pub fn append(&mut self, value: i64) -> Result<usize> {
        if !self.has_capacity() {
            return Err(LstoreError::PageFull);
        }
        self.slots.push(value);
        Ok(self.slots.len() - 1)
    }

    /// Reads the value at a slot.
    pub fn read(&self, slot: usize) -> Result<i64> {
        self.slots
            .get(slot)
            .copied()
            .ok_or(LstoreError::SlotOutOfRange {
                slot,
                count: self.slots.len(),
            })
    }

    /// Drops every slot at or past `len`. Recovery writeback only: brings a
    /// column page back to the slot count its sibling columns agree on.
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    /// Overwrites an existing slot in place. Merge writeback only.
    pub fn overwrite(&mut self, slot: usize, value: i64) -> Result<()> {
        let count = self.slots.len();
        match self.slots.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(LstoreError::SlotOutOfRange { slot, count }),
        }
    }

    /// Serializes the page to its on-disk JSON form.
    pub fn to_json(&self) -> Result<String> {
        let file = PageFile {
            slot_count: self.slots.len(),
            slots: self.slots.clone(),
        };
        serde_json::to_string(&file)
            .map_err(|e| LstoreError::Metadata(format!("page serialization failed: {e}")))
    }

    /// Deserializes a page from its on-disk JSON form.
    ///
    /// A `slot_count` disagreeing with the stored vector is reconciled by
    /// truncating to the shorter of the two (the last consistent prefix) and
    /// logging a warning. Unparseable input is a `CorruptPage` error; `origin`
    /// names the page in that error and in the warning.
    pub fn from_json(data: &str, origin: &str) -> Result<Self> {
        let file: PageFile =
            serde_json::from_str(data).map_err(|e| LstoreError::CorruptPage {
                page: origin.to_string(),
                reason: e.to_string(),
            })?;

        let mut slots = file.slots;
        if file.slot_count != slots.len() {
            let consistent = file.slot_count.min(slots.len());
            tracing::warn!(
                page = origin,
                declared = file.slot_count,
                stored = slots.len(),
                truncated_to = consistent,
                "slot count mismatch, truncating page to consistent prefix"
            );
            slots.truncate(consistent);
        }
        if slots.len() > PAGE_CAPACITY {
            return Err(LstoreError::CorruptPage {
                page: origin.to_string(),
                reason: format!("{} slots exceed page capacity", slots.len()),
            });
        }

        Ok(Self {
            slots,
            capacity: PAGE_CAPACITY,
        })
    }
}
