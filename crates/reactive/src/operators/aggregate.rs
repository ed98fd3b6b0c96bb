//! Terminal fold of a table stream into its final snapshot.

use crate::stream::{Sink, StreamEvent, TableStream};
use alloc::vec::Vec;
use core::hash::Hash;
use tabula_core::{RowChange, TableSnapshot, UpdateBatch};

/// Folds a table stream down to one batch holding its final snapshot.
///
/// Intermediate batches are swallowed; when the upstream completes, the
/// latest snapshot is re-emitted as a single all-insert batch, then the
/// output completes. An upstream that completes without emitting yields one
/// empty batch. Failures pass through.
pub fn aggregate<K, V>(source: &TableStream<K, V>) -> TableStream<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    let source = source.clone();

    TableStream::create(move |sink| {
        let mut latest = TableSnapshot::new();

        source.attach(Sink::new(move |event: StreamEvent<UpdateBatch<K, V>>| match event {
            StreamEvent::Next(batch) => latest = batch.snapshot,
            StreamEvent::Failed(error) => sink.fail(error),
            StreamEvent::Completed => {
                let changes: Vec<RowChange<K, V>> = latest
                    .iter()
                    .map(|(key, value)| RowChange::insert(key.clone(), value.clone()))
                    .collect();
                sink.next(UpdateBatch::new(latest.clone(), changes));
                sink.complete();
            }
        }))
    })
}
