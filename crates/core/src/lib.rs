//! Tabula Core - foundational types for incremental table streams.
//!
//! This crate provides the data model shared by every Tabula crate:
//!
//! - `RowChange<K, V>`: a row's membership transition (insert/update/delete)
//! - `TableSnapshot<K, V>`: immutable keyed table contents at one instant
//! - `UpdateBatch<K, V>`: a snapshot paired with the diff that produced it
//! - `Error`: error types for stream and index operations
//!
//! # Example
//!
//! ```rust
//! use tabula_core::{RowChange, TableSnapshot, UpdateBatch};
//!
//! let previous: TableSnapshot<u32, &str> = TableSnapshot::new();
//! let changes = vec![RowChange::insert(1, "row")];
//! let snapshot = previous.apply(&changes).unwrap();
//! let batch = UpdateBatch::new(snapshot, changes);
//!
//! assert_eq!(batch.snapshot.get(&1), Some(&"row"));
//! assert_eq!(previous.apply(&batch.changes).unwrap(), batch.snapshot);
//! ```

#![no_std]

extern crate alloc;

mod batch;
mod change;
mod error;
mod snapshot;

pub use batch::UpdateBatch;
pub use change::RowChange;
pub use error::{Error, Result};
pub use snapshot::TableSnapshot;
