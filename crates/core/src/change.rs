//! Row change union for keyed table streams.
//!
//! A `RowChange` describes one row's membership transition in a keyed table.
//! Updates and deletes carry the previous value since downstream operators
//! need it (e.g. to retract a derived row).

/// A row-level membership transition in a keyed table.
///
/// This is a closed sum type; exhaustive three-way `match` is the only
/// dispatch pattern. Equality is structural, which test assertions rely on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowChange<K, V> {
    /// A key absent from the table gained a value.
    Insert { key: K, value: V },
    /// A present key changed value.
    Update { key: K, previous: V, value: V },
    /// A present key left the table.
    Delete { key: K, previous: V },
}

impl<K, V> RowChange<K, V> {
    /// Creates an insert change.
    #[inline]
    pub fn insert(key: K, value: V) -> Self {
        RowChange::Insert { key, value }
    }

    /// Creates an update change carrying both the previous and new value.
    #[inline]
    pub fn update(key: K, previous: V, value: V) -> Self {
        RowChange::Update {
            key,
            previous,
            value,
        }
    }

    /// Creates a delete change carrying the removed value.
    #[inline]
    pub fn delete(key: K, previous: V) -> Self {
        RowChange::Delete { key, previous }
    }

    /// Returns the key this change applies to.
    #[inline]
    pub fn key(&self) -> &K {
        match self {
            RowChange::Insert { key, .. }
            | RowChange::Update { key, .. }
            | RowChange::Delete { key, .. } => key,
        }
    }

    /// Returns true for an insert.
    #[inline]
    pub fn is_insert(&self) -> bool {
        matches!(self, RowChange::Insert { .. })
    }

    /// Returns true for an update.
    #[inline]
    pub fn is_update(&self) -> bool {
        matches!(self, RowChange::Update { .. })
    }

    /// Returns true for a delete.
    #[inline]
    pub fn is_delete(&self) -> bool {
        matches!(self, RowChange::Delete { .. })
    }
}
