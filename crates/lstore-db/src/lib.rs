//! L-Store database: catalog, lifecycle, and the query facade.
//!
//! A [`Database`] binds a data directory, owns the table catalog, and shares
//! one page cache across its tables. A [`Query`] borrows one table and
//! exposes the point operations the engine supports: insert, select (at any
//! version), update, delete, and range sums.

mod database;
mod query;

pub use database::Database;
pub use query::Query;

pub use lstore_common::{LstoreError, Result, StorageConfig};
pub use lstore_storage::{Record, Table};
