//! Tabula Incremental - incremental maintenance of keyed table state.
//!
//! This crate holds the pure state machines behind Tabula's table streams.
//! They consume and produce [`tabula_core::UpdateBatch`] values and know
//! nothing about subscriptions; the push layer lives in `tabula-reactive`.
//!
//! - [`RowReducer`]: converts raw keyed arrivals into snapshot+diff batches,
//!   eliding no-op updates.
//! - [`LeftJoinState`]: maintains a left-outer join incrementally as batches
//!   arrive from either side, via a materialized result index, a reverse join
//!   index and a cached right snapshot.

#![no_std]

extern crate alloc;

pub mod join;
pub mod reduce;

pub use join::LeftJoinState;
pub use reduce::RowReducer;
