//! Physical record layout: meta columns and RID allocation policy.
//!
//! Every physical record, base or tail, stores four meta columns followed by
//! the table's user columns. All cells are signed 64-bit integers.

use serde::{Deserialize, Serialize};

/// Base row: RID of the newest tail (or the base's own RID if never updated).
/// Tail row: RID of the previous version in the chain.
pub const INDIRECTION_COLUMN: usize = 0;

/// The record's own RID, stored redundantly on every row.
pub const RID_COLUMN: usize = 1;

/// Last-write time in epoch milliseconds.
pub const TIMESTAMP_COLUMN: usize = 2;

/// Bitmask of updated user columns (meaningful on tail rows only).
pub const SCHEMA_ENCODING_COLUMN: usize = 3;

/// Count of meta columns; user columns follow these.
pub const META_COLUMNS: usize = 4;

/// First base RID. Base RIDs grow upward from here.
pub const BASE_RID_START: i64 = 1;

/// First tail RID. The large offset keeps tail RIDs disjoint from base RIDs.
pub const TAIL_RID_START: i64 = 1_000_000_000;

/// Record identifier, unique within a table.
///
/// Base and tail records draw from disjoint ranges so a RID's tier can be
/// recovered from its value alone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Rid(pub i64);

impl Rid {
    /// Returns the raw integer value as stored in the RID column.
    #[inline]
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns true if this RID identifies a base record.
    #[inline]
    pub fn is_base(&self) -> bool {
        self.0 < TAIL_RID_START
    }

    /// Returns true if this RID identifies a tail record.
    #[inline]
    pub fn is_tail(&self) -> bool {
        self.0 >= TAIL_RID_START
    }
}

impl std::fmt::Display for Rid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
