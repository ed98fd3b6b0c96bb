//! Method-call ergonomics for table streams.

use crate::operators;
use crate::stream::{Stream, TableStream};
use core::hash::Hash;
use tabula_core::Result;

/// Chaining adapter over [`TableStream`].
///
/// Free functions in [`crate::operators`] do the work; this trait only
/// provides the method-call spelling, so pipelines read top-down.
pub trait IndexedStreamExt<K, V> {
    /// See [`operators::left_join`].
    fn left_join<RK, RV, R, FK, S>(
        &self,
        right: &TableStream<RK, RV>,
        foreign_key: FK,
        selector: S,
    ) -> TableStream<K, R>
    where
        RK: Eq + Hash + Clone + 'static,
        RV: Clone + 'static,
        R: Clone + 'static,
        FK: Fn(&V) -> Result<Option<RK>> + 'static,
        S: Fn(&V, Option<&RV>) -> Result<R> + 'static;

    /// See [`operators::aggregate`].
    fn aggregate(&self) -> TableStream<K, V>;

    /// See [`operators::publish`].
    fn publish<O>(
        &self,
        selector: impl Fn(&TableStream<K, V>) -> Stream<O> + 'static,
    ) -> Stream<O>
    where
        O: 'static;
}

impl<K, V> IndexedStreamExt<K, V> for TableStream<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + PartialEq + 'static,
{
    fn left_join<RK, RV, R, FK, S>(
        &self,
        right: &TableStream<RK, RV>,
        foreign_key: FK,
        selector: S,
    ) -> TableStream<K, R>
    where
        RK: Eq + Hash + Clone + 'static,
        RV: Clone + 'static,
        R: Clone + 'static,
        FK: Fn(&V) -> Result<Option<RK>> + 'static,
        S: Fn(&V, Option<&RV>) -> Result<R> + 'static,
    {
        operators::left_join(self, right, foreign_key, selector)
    }

    fn aggregate(&self) -> TableStream<K, V> {
        operators::aggregate(self)
    }

    fn publish<O>(
        &self,
        selector: impl Fn(&TableStream<K, V>) -> Stream<O> + 'static,
    ) -> Stream<O>
    where
        O: 'static,
    {
        operators::publish(self, selector)
    }
}
