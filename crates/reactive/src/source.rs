//! Adapters that turn raw value sequences into table streams.

use crate::stream::{Sink, Stream, StreamEvent, TableStream};
use crate::subscription::Subscription;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::hash::Hash;
use tabula_core::{RowChange, TableSnapshot, UpdateBatch};
use tabula_incremental::RowReducer;

/// Indexes a raw value stream into a table stream.
///
/// Each subscription wires the upstream through a fresh
/// [`RowReducer`], so no index state is shared or resumed between
/// subscriptions. `key_of` must be stable for a given value; `is_deleted`
/// marks arrivals that remove the keyed row. Arrivals the reducer elides
/// (deletes of absent keys, structurally equal replays) produce no batch.
pub fn index_by<K, V>(
    values: &Stream<V>,
    key_of: impl Fn(&V) -> K + 'static,
    is_deleted: impl Fn(&V) -> bool + 'static,
) -> TableStream<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    let values = values.clone();
    let key_of = Rc::new(key_of);
    let is_deleted = Rc::new(is_deleted);

    Stream::create(move |sink| {
        let mut reducer = RowReducer::new();
        let key_of = Rc::clone(&key_of);
        let is_deleted = Rc::clone(&is_deleted);

        values.attach(Sink::new(move |event| match event {
            StreamEvent::Next(value) => {
                let key = key_of(&value);
                let deleted = is_deleted(&value);
                if let Some(batch) = reducer.apply(key, value, deleted) {
                    sink.next(batch);
                }
            }
            StreamEvent::Failed(error) => sink.fail(error),
            StreamEvent::Completed => sink.complete(),
        }))
    })
}

/// [`index_by`] for sources without a deletion marker: every arrival is an
/// insert or update.
pub fn index_by_key<K, V>(
    values: &Stream<V>,
    key_of: impl Fn(&V) -> K + 'static,
) -> TableStream<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    index_by(values, key_of, |_| false)
}

/// A table stream over a static collection: one all-insert batch in the
/// collection's own order, then completion.
///
/// A duplicate key in `entries` is a terminal failure, not a silent
/// last-write-wins.
pub fn from_entries<K, V>(entries: Vec<(K, V)>) -> TableStream<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    Stream::create(move |sink| {
        let changes: Vec<RowChange<K, V>> = entries
            .iter()
            .cloned()
            .map(|(key, value)| RowChange::insert(key, value))
            .collect();

        match TableSnapshot::new().apply(&changes) {
            Ok(snapshot) => {
                sink.next(UpdateBatch::new(snapshot, changes));
                sink.complete();
            }
            Err(error) => sink.fail(error),
        }
        Subscription::empty()
    })
}

/// A table stream over an existing snapshot: one all-insert batch, then
/// completion. Change order follows the snapshot's iteration order.
pub fn from_snapshot<K, V>(snapshot: TableSnapshot<K, V>) -> TableStream<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    Stream::create(move |sink| {
        let changes: Vec<RowChange<K, V>> = snapshot
            .iter()
            .map(|(key, value)| RowChange::insert(key.clone(), value.clone()))
            .collect();

        sink.next(UpdateBatch::new(snapshot.clone(), changes));
        sink.complete();
        Subscription::empty()
    })
}
