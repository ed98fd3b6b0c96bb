//! Property-based tests for the arrival reducer.
//!
//! These verify the batch invariant the whole pipeline relies on: folding a
//! batch's changes onto the previous snapshot reproduces the carried
//! snapshot, for arbitrary arrival sequences.

use proptest::prelude::*;
use tabula_core::TableSnapshot;
use tabula_incremental::RowReducer;

/// One raw arrival: key, value, deletion flag.
type Arrival = (u8, i32, bool);

fn arrivals_strategy(max_len: usize) -> impl Strategy<Value = Vec<Arrival>> {
    // a small key space forces plenty of updates, elisions and deletes
    prop::collection::vec((0u8..8, -5i32..5, prop::bool::ANY), 0..max_len)
}

proptest! {
    /// Property: every emitted batch satisfies
    /// `previous.apply(changes) == snapshot`.
    #[test]
    fn changes_fold_onto_previous_snapshot(arrivals in arrivals_strategy(64)) {
        let mut reducer = RowReducer::new();
        let mut previous: TableSnapshot<u8, i32> = TableSnapshot::new();

        for (key, value, deleted) in arrivals {
            if let Some(batch) = reducer.apply(key, value, deleted) {
                prop_assert_eq!(previous.apply(&batch.changes).unwrap(), batch.snapshot.clone());
                previous = batch.snapshot;
            }
        }

        prop_assert_eq!(&previous, reducer.index());
    }

    /// Property: replaying a structurally equal value for a live key emits
    /// nothing.
    #[test]
    fn repeated_value_is_elided(arrivals in arrivals_strategy(32)) {
        let mut reducer = RowReducer::new();

        for (key, value, deleted) in arrivals {
            let emitted = reducer.apply(key, value, deleted);
            if !deleted && emitted.is_some() {
                prop_assert!(reducer.apply(key, value, false).is_none());
            }
        }
    }

    /// Property: every batch carries exactly one change, and the reducer
    /// index always matches the last emitted snapshot.
    #[test]
    fn batches_are_single_change(arrivals in arrivals_strategy(64)) {
        let mut reducer = RowReducer::new();

        for (key, value, deleted) in arrivals {
            if let Some(batch) = reducer.apply(key, value, deleted) {
                prop_assert_eq!(batch.changes.len(), 1);
                prop_assert_eq!(&batch.snapshot, reducer.index());
            }
        }
    }
}
