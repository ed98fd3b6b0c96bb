//! Incremental left-outer-join maintenance.
//!
//! [`LeftJoinState`] keeps three structures mutually consistent as batches
//! arrive from either side of the join:
//!
//! - the materialized result index (left key → joined result), published with
//!   every output batch;
//! - the reverse join index (right key → the left rows currently keyed on it),
//!   which makes right-side fan-out proportional to matches rather than to
//!   table size;
//! - the cached right snapshot, used to resolve left rows as they arrive.
//!
//! Every left row appears exactly once in the result, matched or not. A left
//! row emitted unmatched is never rewritten; when its right row arrives later
//! the engine emits a separate update.

use alloc::vec::Vec;
use core::hash::Hash;
use hashbrown::HashMap;
use tabula_core::{Error, Result, RowChange, TableSnapshot, UpdateBatch};

/// Per-row bookkeeping carried by intermediate changes: enough to fold the
/// reverse index and to project the publishable result.
#[derive(Clone, Debug)]
struct Resolved<LV, RK, R> {
    left: LV,
    foreign_key: Option<RK>,
    result: R,
}

type Intermediate<LK, LV, RK, R> = RowChange<LK, Resolved<LV, RK, R>>;

/// State for one left-outer-join subscription.
///
/// Created empty at subscription start, mutated once per incoming batch, and
/// discarded when the subscription ends; never shared across subscriptions.
pub struct LeftJoinState<LK, LV, RK, RV, R> {
    result_index: TableSnapshot<LK, R>,
    reverse_index: HashMap<RK, Vec<(LK, LV)>>,
    right_snapshot: TableSnapshot<RK, RV>,
}

impl<LK, LV, RK, RV, R> Default for LeftJoinState<LK, LV, RK, RV, R> {
    fn default() -> Self {
        Self {
            result_index: TableSnapshot::default(),
            reverse_index: HashMap::new(),
            right_snapshot: TableSnapshot::default(),
        }
    }
}

impl<LK, LV, RK, RV, R> LeftJoinState<LK, LV, RK, RV, R>
where
    LK: Eq + Hash + Clone,
    LV: Clone + PartialEq,
    RK: Eq + Hash + Clone,
    RV: Clone,
    R: Clone,
{
    /// Creates empty join state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The materialized result index as of the last applied batch.
    pub fn result_index(&self) -> &TableSnapshot<LK, R> {
        &self.result_index
    }

    /// The cached right-hand snapshot as of the last right-origin batch.
    pub fn right_snapshot(&self) -> &TableSnapshot<RK, RV> {
        &self.right_snapshot
    }

    /// Number of right keys currently holding at least one associated left
    /// row. Buckets are removed with their last member, so this never counts
    /// empty entries.
    pub fn reverse_index_len(&self) -> usize {
        self.reverse_index.len()
    }

    /// Applies a left-origin batch.
    ///
    /// Returns the output batch, or `None` when the batch produced no
    /// intermediate changes. On `Err` no state was mutated and nothing may be
    /// emitted.
    pub fn apply_left<FK, S>(
        &mut self,
        batch: &UpdateBatch<LK, LV>,
        foreign_key: &FK,
        selector: &S,
    ) -> Result<Option<UpdateBatch<LK, R>>>
    where
        FK: Fn(&LV) -> Result<Option<RK>>,
        S: Fn(&LV, Option<&RV>) -> Result<R>,
    {
        let intermediate = self.derive_from_left(batch, foreign_key, selector)?;
        self.commit(intermediate, None)
    }

    /// Applies a right-origin batch.
    ///
    /// The batch's carried snapshot always replaces the cached right snapshot,
    /// even when no left row matched, so that later left inserts resolve
    /// against it. The result and reverse indexes are only touched when the
    /// batch matched at least one left row.
    pub fn apply_right<S>(
        &mut self,
        batch: &UpdateBatch<RK, RV>,
        selector: &S,
    ) -> Result<Option<UpdateBatch<LK, R>>>
    where
        S: Fn(&LV, Option<&RV>) -> Result<R>,
    {
        let intermediate = self.derive_from_right(batch, selector)?;
        self.commit(intermediate, Some(batch.snapshot.clone()))
    }

    /// Folds derived intermediate changes into the three indexes and projects
    /// the publishable output batch.
    fn commit(
        &mut self,
        intermediate: Vec<Intermediate<LK, LV, RK, R>>,
        right_snapshot: Option<TableSnapshot<RK, RV>>,
    ) -> Result<Option<UpdateBatch<LK, R>>> {
        if let Some(snapshot) = right_snapshot {
            self.right_snapshot = snapshot;
        }
        if intermediate.is_empty() {
            return Ok(None);
        }

        let published: Vec<RowChange<LK, R>> = intermediate.iter().map(Self::project).collect();

        // fold the result index first; it re-checks the index invariants, and
        // failing here must leave the reverse index untouched
        let next_result = self.result_index.apply(&published)?;
        for change in &intermediate {
            self.fold_reverse(change);
        }
        self.result_index = next_result;

        Ok(Some(UpdateBatch::new(self.result_index.clone(), published)))
    }

    /// Drops the bookkeeping fields, leaving only key and result.
    fn project(change: &Intermediate<LK, LV, RK, R>) -> RowChange<LK, R> {
        match change {
            RowChange::Insert { key, value } => RowChange::insert(key.clone(), value.result.clone()),
            RowChange::Update {
                key,
                previous,
                value,
            } => RowChange::update(key.clone(), previous.result.clone(), value.result.clone()),
            RowChange::Delete { key, previous } => {
                RowChange::delete(key.clone(), previous.result.clone())
            }
        }
    }

    fn derive_from_left<FK, S>(
        &self,
        batch: &UpdateBatch<LK, LV>,
        foreign_key: &FK,
        selector: &S,
    ) -> Result<Vec<Intermediate<LK, LV, RK, R>>>
    where
        FK: Fn(&LV) -> Result<Option<RK>>,
        S: Fn(&LV, Option<&RV>) -> Result<R>,
    {
        let mut derived = Vec::with_capacity(batch.changes.len());
        for change in &batch.changes {
            match change {
                RowChange::Insert { key, value } => {
                    // a left insert is always a result insert; its foreign key
                    // may already match something in the right snapshot
                    if self.result_index.contains_key(key) {
                        return Err(Error::key_already_present("join result index"));
                    }
                    derived.push(RowChange::insert(
                        key.clone(),
                        self.resolve(value, foreign_key, selector)?,
                    ));
                }
                RowChange::Update {
                    key,
                    previous,
                    value,
                } => {
                    // the left row changed; its foreign key may have changed
                    // with it, but the right snapshot has not
                    let previous_result = self.previous_result(key)?;
                    derived.push(RowChange::update(
                        key.clone(),
                        self.resolve_previous(previous, foreign_key, previous_result)?,
                        self.resolve(value, foreign_key, selector)?,
                    ));
                }
                RowChange::Delete { key, previous } => {
                    let previous_result = self.previous_result(key)?;
                    derived.push(RowChange::delete(
                        key.clone(),
                        self.resolve_previous(previous, foreign_key, previous_result)?,
                    ));
                }
            }
        }
        Ok(derived)
    }

    fn derive_from_right<S>(
        &self,
        batch: &UpdateBatch<RK, RV>,
        selector: &S,
    ) -> Result<Vec<Intermediate<LK, LV, RK, R>>>
    where
        S: Fn(&LV, Option<&RV>) -> Result<R>,
    {
        let mut derived = Vec::new();
        for change in &batch.changes {
            // left rows already emitted can only move forward as updates,
            // whichever way the right row transitioned
            let (right_key, new_right) = match change {
                RowChange::Insert { key, value } => (key, Some(value)),
                RowChange::Update { key, value, .. } => (key, Some(value)),
                RowChange::Delete { key, .. } => (key, None),
            };

            let Some(matched) = self.reverse_index.get(right_key) else {
                continue;
            };
            for (left_key, left_value) in matched {
                let previous_result = self.previous_result(left_key)?;
                let result = selector(left_value, new_right)?;
                derived.push(RowChange::update(
                    left_key.clone(),
                    Resolved {
                        left: left_value.clone(),
                        foreign_key: Some(right_key.clone()),
                        result: previous_result,
                    },
                    Resolved {
                        left: left_value.clone(),
                        foreign_key: Some(right_key.clone()),
                        result,
                    },
                ));
            }
        }
        Ok(derived)
    }

    /// Resolves a left value against the current right snapshot and computes
    /// its result.
    fn resolve<FK, S>(
        &self,
        left: &LV,
        foreign_key: &FK,
        selector: &S,
    ) -> Result<Resolved<LV, RK, R>>
    where
        FK: Fn(&LV) -> Result<Option<RK>>,
        S: Fn(&LV, Option<&RV>) -> Result<R>,
    {
        let key = foreign_key(left)?;
        let right = key.as_ref().and_then(|k| self.right_snapshot.get(k));
        let result = selector(left, right)?;
        Ok(Resolved {
            left: left.clone(),
            foreign_key: key,
            result,
        })
    }

    /// Like [`Self::resolve`], but reuses the already materialized result
    /// instead of re-running the selector.
    fn resolve_previous<FK>(
        &self,
        left: &LV,
        foreign_key: &FK,
        result: R,
    ) -> Result<Resolved<LV, RK, R>>
    where
        FK: Fn(&LV) -> Result<Option<RK>>,
    {
        let key = foreign_key(left)?;
        Ok(Resolved {
            left: left.clone(),
            foreign_key: key,
            result,
        })
    }

    fn previous_result(&self, key: &LK) -> Result<R> {
        self.result_index
            .get(key)
            .cloned()
            .ok_or(Error::key_not_found("join result index"))
    }

    fn fold_reverse(&mut self, change: &Intermediate<LK, LV, RK, R>) {
        match change {
            RowChange::Insert { key, value } => {
                if let Some(right_key) = &value.foreign_key {
                    Self::register(&mut self.reverse_index, right_key, key, &value.left);
                }
            }
            RowChange::Update {
                key,
                previous,
                value,
            } => {
                if previous.foreign_key != value.foreign_key || previous.left != value.left {
                    if let Some(right_key) = &previous.foreign_key {
                        Self::deregister(&mut self.reverse_index, right_key, key);
                    }
                    if let Some(right_key) = &value.foreign_key {
                        Self::register(&mut self.reverse_index, right_key, key, &value.left);
                    }
                }
            }
            RowChange::Delete { key, previous } => {
                if let Some(right_key) = &previous.foreign_key {
                    Self::deregister(&mut self.reverse_index, right_key, key);
                }
            }
        }
    }

    fn register(
        reverse: &mut HashMap<RK, Vec<(LK, LV)>>,
        right_key: &RK,
        left_key: &LK,
        left_value: &LV,
    ) {
        let bucket = reverse.entry(right_key.clone()).or_default();
        match bucket.iter_mut().find(|(key, _)| key == left_key) {
            Some(member) => member.1 = left_value.clone(),
            None => bucket.push((left_key.clone(), left_value.clone())),
        }
    }

    fn deregister(reverse: &mut HashMap<RK, Vec<(LK, LV)>>, right_key: &RK, left_key: &LK) {
        if let Some(bucket) = reverse.get_mut(right_key) {
            bucket.retain(|(key, _)| key != left_key);
            // removing the last member removes the bucket itself
            if bucket.is_empty() {
                reverse.remove(right_key);
            }
        }
    }
}
