//! Immutable keyed snapshots of table contents.
//!
//! A `TableSnapshot` represents the full contents of a table at one instant.
//! Cloning a snapshot copies a shared handle; deriving a new snapshot clones
//! the underlying map once (clone-on-write), so every update batch can own a
//! complete independent snapshot without mutating state visible to other
//! readers.

use crate::change::RowChange;
use crate::error::{Error, Result};
use alloc::rc::Rc;
use core::fmt;
use core::hash::Hash;
use hashbrown::HashMap;

/// An immutable keyed mapping representing table contents at one instant.
pub struct TableSnapshot<K, V> {
    map: Rc<HashMap<K, V>>,
}

impl<K, V> Clone for TableSnapshot<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: Rc::clone(&self.map),
        }
    }
}

impl<K, V> Default for TableSnapshot<K, V> {
    fn default() -> Self {
        Self {
            map: Rc::new(HashMap::new()),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TableSnapshot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for TableSnapshot<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K: Eq + Hash, V> TableSnapshot<K, V> {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing map as a snapshot.
    pub fn from_map(map: HashMap<K, V>) -> Self {
        Self { map: Rc::new(map) }
    }

    /// Looks up the value for a key.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Returns true if the key is present.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates over all entries. Iteration order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }
}

impl<K, V> TableSnapshot<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Returns a new snapshot with the key set to the given value,
    /// inserting or replacing as needed.
    pub fn with(&self, key: K, value: V) -> Self {
        let mut map = (*self.map).clone();
        map.insert(key, value);
        Self { map: Rc::new(map) }
    }

    /// Returns a new snapshot with the key removed. Absent keys are ignored.
    pub fn without(&self, key: &K) -> Self {
        let mut map = (*self.map).clone();
        map.remove(key);
        Self { map: Rc::new(map) }
    }

    /// Folds an ordered change list onto this snapshot, producing the
    /// snapshot after all changes.
    ///
    /// Source contract violations are signalled rather than repaired: an
    /// insert for a present key fails with [`Error::KeyAlreadyPresent`], an
    /// update or delete for an absent key with [`Error::KeyNotFound`].
    pub fn apply(&self, changes: &[RowChange<K, V>]) -> Result<Self> {
        let mut map = (*self.map).clone();
        for change in changes {
            match change {
                RowChange::Insert { key, value } => {
                    if map.contains_key(key) {
                        return Err(Error::key_already_present("table snapshot"));
                    }
                    map.insert(key.clone(), value.clone());
                }
                RowChange::Update { key, value, .. } => {
                    if map.insert(key.clone(), value.clone()).is_none() {
                        return Err(Error::key_not_found("table snapshot"));
                    }
                }
                RowChange::Delete { key, .. } => {
                    if map.remove(key).is_none() {
                        return Err(Error::key_not_found("table snapshot"));
                    }
                }
            }
        }
        Ok(Self { map: Rc::new(map) })
    }

    /// Copies the snapshot contents into an owned map.
    pub fn to_map(&self) -> HashMap<K, V> {
        (*self.map).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_with_and_without() {
        let empty: TableSnapshot<i32, &str> = TableSnapshot::new();
        assert!(empty.is_empty());

        let one = empty.with(1, "a");
        let two = one.with(2, "b");

        // earlier snapshots are unaffected
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(two.get(&1), Some(&"a"));

        let back = two.without(&1);
        assert_eq!(back.len(), 1);
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn test_clone_is_shared_handle() {
        let snapshot = TableSnapshot::new().with(1, "a");
        let cloned = snapshot.clone();
        assert_eq!(snapshot, cloned);
    }

    #[test]
    fn test_apply_folds_changes() {
        let snapshot = TableSnapshot::new().with(1, "a");
        let next = snapshot
            .apply(&[
                RowChange::insert(2, "b"),
                RowChange::update(1, "a", "a2"),
                RowChange::delete(2, "b"),
            ])
            .unwrap();

        assert_eq!(next.len(), 1);
        assert_eq!(next.get(&1), Some(&"a2"));
        // the source snapshot still holds its own state
        assert_eq!(snapshot.get(&1), Some(&"a"));
    }

    #[test]
    fn test_apply_rejects_duplicate_insert() {
        let snapshot = TableSnapshot::new().with(1, "a");
        let err = snapshot.apply(&[RowChange::insert(1, "b")]).unwrap_err();
        assert!(matches!(err, Error::KeyAlreadyPresent { .. }));
    }

    #[test]
    fn test_apply_rejects_update_of_absent_key() {
        let snapshot: TableSnapshot<i32, &str> = TableSnapshot::new();
        let err = snapshot
            .apply(&[RowChange::update(1, "a", "b")])
            .unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
    }

    #[test]
    fn test_apply_rejects_delete_of_absent_key() {
        let snapshot: TableSnapshot<i32, &str> = TableSnapshot::new();
        let err = snapshot.apply(&[RowChange::delete(1, "a")]).unwrap_err();
        assert!(matches!(err, Error::KeyNotFound { .. }));
    }

    #[test]
    fn test_from_map() {
        let mut map = HashMap::new();
        map.insert(1, "a");
        map.insert(2, "b");
        let snapshot = TableSnapshot::from_map(map);

        assert_eq!(snapshot.len(), 2);
        let collected = snapshot.to_map();
        assert_eq!(collected.get(&2), Some(&"b"));
    }

    #[test]
    fn test_apply_empty_changes() {
        let snapshot = TableSnapshot::new().with(1, "a");
        let next = snapshot.apply(&vec![]).unwrap();
        assert_eq!(next, snapshot);
    }
}
