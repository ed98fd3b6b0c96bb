//! Update batches: a snapshot paired with the diff that produced it.

use crate::change::RowChange;
use crate::snapshot::TableSnapshot;
use alloc::vec;
use alloc::vec::Vec;
use core::hash::Hash;

/// One stream notification: the table snapshot after `changes` were applied,
/// together with the ordered change list itself.
///
/// Invariant: folding `changes` onto the previous batch's snapshot reproduces
/// `snapshot` exactly (see [`TableSnapshot::apply`]).
#[derive(Clone, Debug)]
pub struct UpdateBatch<K, V> {
    /// Table state after `changes`.
    pub snapshot: TableSnapshot<K, V>,
    /// Changes since the previous batch, in application order.
    pub changes: Vec<RowChange<K, V>>,
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for UpdateBatch<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot == other.snapshot && self.changes == other.changes
    }
}

impl<K, V> UpdateBatch<K, V> {
    /// Creates a batch from a snapshot and its change list.
    pub fn new(snapshot: TableSnapshot<K, V>, changes: Vec<RowChange<K, V>>) -> Self {
        Self { snapshot, changes }
    }

    /// Creates a batch carrying a single change.
    pub fn single(snapshot: TableSnapshot<K, V>, change: RowChange<K, V>) -> Self {
        Self {
            snapshot,
            changes: vec![change],
        }
    }
}
