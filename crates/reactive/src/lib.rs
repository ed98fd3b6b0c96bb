//! Tabula Reactive - the push-stream layer over incremental table state.
//!
//! Everything here is single-threaded and synchronous: a [`Stream`] is a
//! subscribe function, a [`Subject`] is a hand-driven multicast hub, and the
//! operators wire [`tabula_incremental`]'s state machines into live
//! pipelines. Batches flow as [`UpdateBatch`] values, so the output of any
//! operator can feed the next.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tabula_reactive::{from_entries, IndexedStreamExt, StreamEvent};
//!
//! let people = from_entries(vec![(1u32, ("ada", Some(10u32)))]);
//! let teams = from_entries(vec![(10u32, "storage")]);
//!
//! let joined = people.left_join(
//!     &teams,
//!     |person: &(&str, Option<u32>)| Ok(person.1),
//!     |person: &(&str, Option<u32>), team: Option<&&str>| Ok((person.0, team.copied())),
//! );
//!
//! let last = Rc::new(RefCell::new(None));
//! let captured = last.clone();
//! let _sub = joined.aggregate().subscribe(move |event| {
//!     if let StreamEvent::Next(batch) = event {
//!         *captured.borrow_mut() = Some(batch.snapshot);
//!     }
//! });
//!
//! let snapshot = last.borrow().clone().unwrap();
//! assert_eq!(snapshot.get(&1), Some(&("ada", Some("storage"))));
//! ```

#![no_std]

extern crate alloc;

mod ext;
pub mod operators;
mod source;
mod stream;
mod subject;
mod subscription;

pub use ext::IndexedStreamExt;
pub use operators::{aggregate, left_join, publish};
pub use source::{from_entries, from_snapshot, index_by, index_by_key};
pub use stream::{Sink, Stream, StreamEvent, TableStream};
pub use subject::{Subject, TableSubject};
pub use subscription::Subscription;

pub use tabula_core::{Error, Result, RowChange, TableSnapshot, UpdateBatch};
