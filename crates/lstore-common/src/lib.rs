//! L-Store common types, errors, and utilities.
//!
//! This crate provides shared definitions used across all engine components.

pub mod config;
pub mod error;
pub mod layout;
pub mod page;

pub use config::StorageConfig;
pub use error::{LstoreError, Result};
pub use layout::{Rid, META_COLUMNS};
pub use page::{ColumnPage, PageKey, PageTier, PAGE_CAPACITY};
