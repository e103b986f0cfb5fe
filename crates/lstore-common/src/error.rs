//! Error types for the L-Store engine.

use thiserror::Error;

/// Result type alias using LstoreError.
pub type Result<T> = std::result::Result<T, LstoreError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum LstoreError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Storage errors
    #[error("Page corrupted: {page}, reason: {reason}")]
    CorruptPage { page: String, reason: String },

    #[error("Buffer pool exhausted, all frames pinned")]
    BufferPoolExhausted,

    #[error("Page full, unable to append slot")]
    PageFull,

    #[error("Slot {slot} out of range (page holds {count})")]
    SlotOutOfRange { slot: usize, count: usize },

    // Record errors
    #[error("Duplicate key: {key}")]
    DuplicateKey { key: i64 },

    #[error("Record not found for key {key}")]
    RecordNotFound { key: i64 },

    #[error("Key column cannot be updated")]
    KeyColumnImmutable,

    #[error("Expected {expected} columns, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Column {column} out of range (table has {num_columns})")]
    ColumnOutOfRange { column: usize, num_columns: usize },

    #[error("Indirection chain broken at RID {rid}")]
    BrokenIndirection { rid: i64 },

    // Catalog errors
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Metadata error: {0}")]
    Metadata(String),
}
