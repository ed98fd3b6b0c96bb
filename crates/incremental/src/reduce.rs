//! Arrival reducer: raw keyed values in, snapshot+diff batches out.
//!
//! The reducer converts one raw arrival `(key, value, deleted)` into at most
//! one single-change [`UpdateBatch`]. It is strictly 1:1; it never coalesces
//! multiple arrivals into one batch.

use core::hash::Hash;
use tabula_core::{RowChange, TableSnapshot, UpdateBatch};

/// Reduces a raw per-key value arrival sequence into update batches.
///
/// Arrivals that would not change the table are suppressed entirely: deletes
/// of absent keys, and updates carrying a value structurally equal to the
/// stored one (spurious updates).
pub struct RowReducer<K, V> {
    index: TableSnapshot<K, V>,
}

impl<K, V> Default for RowReducer<K, V> {
    fn default() -> Self {
        Self {
            index: TableSnapshot::default(),
        }
    }
}

impl<K, V> RowReducer<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    /// Creates an empty reducer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current table snapshot.
    pub fn index(&self) -> &TableSnapshot<K, V> {
        &self.index
    }

    /// Applies one raw arrival, returning the batch it produced, if any.
    ///
    /// The returned batch's snapshot is the table state after the change.
    pub fn apply(&mut self, key: K, value: V, deleted: bool) -> Option<UpdateBatch<K, V>> {
        let current = self.index.get(&key).cloned();

        if deleted {
            let previous = current?;
            self.index = self.index.without(&key);
            return Some(UpdateBatch::single(
                self.index.clone(),
                RowChange::delete(key, previous),
            ));
        }

        match current {
            None => {
                self.index = self.index.with(key.clone(), value.clone());
                Some(UpdateBatch::single(
                    self.index.clone(),
                    RowChange::insert(key, value),
                ))
            }
            // spurious update
            Some(stored) if stored == value => None,
            Some(previous) => {
                self.index = self.index.with(key.clone(), value.clone());
                Some(UpdateBatch::single(
                    self.index.clone(),
                    RowChange::update(key, previous, value),
                ))
            }
        }
    }
}
