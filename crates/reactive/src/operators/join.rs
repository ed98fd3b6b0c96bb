//! Streaming left-outer-join operator.

use crate::stream::{Sink, StreamEvent, TableStream};
use crate::subscription::Subscription;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::hash::Hash;
use tabula_core::Result;
use tabula_incremental::LeftJoinState;

/// Holds the two source subscriptions so either arm can tear down both.
///
/// The slot is filled only after both sources have been subscribed; a
/// teardown requested before that (a source terminating synchronously during
/// wiring) is handled by the post-wiring terminal check in [`left_join`].
#[derive(Default)]
struct JoinRuntime {
    sources: RefCell<Option<(Subscription, Subscription)>>,
}

impl JoinRuntime {
    fn connect(&self, left: Subscription, right: Subscription) {
        *self.sources.borrow_mut() = Some((left, right));
    }

    fn teardown(&self) {
        if let Some((left, right)) = self.sources.borrow_mut().take() {
            left.unsubscribe();
            right.unsubscribe();
        }
    }
}

/// Incrementally maintained left outer join of two table streams.
///
/// Each subscription runs over fresh [`LeftJoinState`]: nothing is shared
/// with, or resumed from, any other subscription. Batches from either side
/// are processed to completion in arrival order. `foreign_key` extracts the
/// optional right key from a left row; `selector` projects the joined result
/// and runs with `None` while the right row is missing.
///
/// A callback error or a state-machine contract violation fails the output
/// and tears down both source subscriptions with nothing emitted for the
/// offending batch. A source failure propagates immediately, first error
/// wins. The output completes only once both sources have completed.
pub fn left_join<LK, LV, RK, RV, R, FK, S>(
    left: &TableStream<LK, LV>,
    right: &TableStream<RK, RV>,
    foreign_key: FK,
    selector: S,
) -> TableStream<LK, R>
where
    LK: Eq + Hash + Clone + 'static,
    LV: Clone + PartialEq + 'static,
    RK: Eq + Hash + Clone + 'static,
    RV: Clone + 'static,
    R: Clone + 'static,
    FK: Fn(&LV) -> Result<Option<RK>> + 'static,
    S: Fn(&LV, Option<&RV>) -> Result<R> + 'static,
{
    let left = left.clone();
    let right = right.clone();
    let foreign_key = Rc::new(foreign_key);
    let selector = Rc::new(selector);

    TableStream::create(move |sink| {
        let state = Rc::new(RefCell::new(LeftJoinState::new()));
        let runtime = Rc::new(JoinRuntime::default());
        let open_sources = Rc::new(Cell::new(2u8));

        let left_arm = {
            let state = Rc::clone(&state);
            let runtime = Rc::clone(&runtime);
            let open_sources = Rc::clone(&open_sources);
            let foreign_key = Rc::clone(&foreign_key);
            let selector = Rc::clone(&selector);
            let sink = sink.clone();
            Sink::new(move |event| match event {
                StreamEvent::Next(batch) => {
                    let applied =
                        state
                            .borrow_mut()
                            .apply_left(&batch, &*foreign_key, &*selector);
                    match applied {
                        Ok(Some(output)) => sink.next(output),
                        Ok(None) => {}
                        Err(error) => {
                            sink.fail(error);
                            runtime.teardown();
                        }
                    }
                }
                StreamEvent::Failed(error) => {
                    sink.fail(error);
                    runtime.teardown();
                }
                StreamEvent::Completed => {
                    open_sources.set(open_sources.get() - 1);
                    if open_sources.get() == 0 {
                        sink.complete();
                        runtime.teardown();
                    }
                }
            })
        };

        let right_arm = {
            let state = Rc::clone(&state);
            let runtime = Rc::clone(&runtime);
            let open_sources = Rc::clone(&open_sources);
            let selector = Rc::clone(&selector);
            let sink = sink.clone();
            Sink::new(move |event| match event {
                StreamEvent::Next(batch) => {
                    let applied = state.borrow_mut().apply_right(&batch, &*selector);
                    match applied {
                        Ok(Some(output)) => sink.next(output),
                        Ok(None) => {}
                        Err(error) => {
                            sink.fail(error);
                            runtime.teardown();
                        }
                    }
                }
                StreamEvent::Failed(error) => {
                    sink.fail(error);
                    runtime.teardown();
                }
                StreamEvent::Completed => {
                    open_sources.set(open_sources.get() - 1);
                    if open_sources.get() == 0 {
                        sink.complete();
                        runtime.teardown();
                    }
                }
            })
        };

        let left_subscription = left.attach(left_arm);
        let right_subscription = right.attach(right_arm);
        runtime.connect(left_subscription, right_subscription);
        // a source may have terminated the output during wiring
        if sink.is_terminated() {
            runtime.teardown();
        }

        let runtime = Rc::clone(&runtime);
        Subscription::new(move || runtime.teardown())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::from_entries;
    use crate::subject::{Subject, TableSubject};
    use alloc::vec;
    use alloc::vec::Vec;
    use tabula_core::{Error, RowChange, UpdateBatch};

    type Fixture = (
        TableSubject<u32, (u32, Option<u32>)>,
        TableSubject<u32, &'static str>,
        TableStream<u32, (u32, Option<&'static str>)>,
    );

    // left rows are (id, optional department key); results pair the id with
    // the resolved department name
    fn fixture() -> Fixture {
        let left: TableSubject<u32, (u32, Option<u32>)> = TableSubject::new();
        let right: TableSubject<u32, &'static str> = TableSubject::new();
        let joined = left_join(
            &left.stream(),
            &right.stream(),
            |row: &(u32, Option<u32>)| Ok(row.1),
            |row: &(u32, Option<u32>), dept: Option<&&'static str>| Ok((row.0, dept.copied())),
        );
        (left, right, joined)
    }

    fn collect<K, V>(
        stream: &TableStream<K, V>,
    ) -> (
        Rc<RefCell<Vec<StreamEvent<UpdateBatch<K, V>>>>>,
        Subscription,
    )
    where
        K: Clone + 'static,
        V: Clone + 'static,
    {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink_events = events.clone();
        let subscription = stream.subscribe(move |event| sink_events.borrow_mut().push(event));
        (events, subscription)
    }

    fn batches<K, V>(events: &[StreamEvent<UpdateBatch<K, V>>]) -> Vec<UpdateBatch<K, V>>
    where
        K: Clone,
        V: Clone,
    {
        events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::Next(batch) => Some(batch.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_left_rows_before_right_resolve_on_arrival() {
        let (left, right, joined) = fixture();
        let (events, _keep) = collect(&joined);

        left.push_insert(1, (1, Some(10))).unwrap();
        left.push_insert(2, (2, Some(10))).unwrap();
        right.push_insert(10, "ops").unwrap();

        let out = batches(&events.borrow());
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].changes, [RowChange::insert(1, (1, None))]);
        assert_eq!(out[1].changes, [RowChange::insert(2, (2, None))]);
        // one right insert fans out to both matched rows, in insertion order
        assert_eq!(
            out[2].changes,
            [
                RowChange::update(1, (1, None), (1, Some("ops"))),
                RowChange::update(2, (2, None), (2, Some("ops"))),
            ]
        );
        assert_eq!(out[2].snapshot.get(&2), Some(&(2, Some("ops"))));
    }

    #[test]
    fn test_right_before_left_resolves_from_cached_snapshot() {
        let (left, right, joined) = fixture();
        let (events, _keep) = collect(&joined);

        // matches no left rows: silent on the output, snapshot still cached
        right.push_insert(10, "ops").unwrap();
        assert!(events.borrow().is_empty());

        left.push_insert(1, (1, Some(10))).unwrap();

        let out = batches(&events.borrow());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].changes, [RowChange::insert(1, (1, Some("ops")))]);
    }

    #[test]
    fn test_absent_foreign_key_stands_unmatched() {
        let (left, right, joined) = fixture();
        let (events, _keep) = collect(&joined);

        left.push_insert(1, (1, None)).unwrap();
        right.push_insert(10, "ops").unwrap();

        let out = batches(&events.borrow());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].changes, [RowChange::insert(1, (1, None))]);
    }

    #[test]
    fn test_completes_only_after_both_sources() {
        let (left, right, joined) = fixture();
        let (events, _keep) = collect(&joined);

        left.complete();
        assert!(events.borrow().is_empty());

        right.complete();
        assert_eq!(*events.borrow(), [StreamEvent::Completed]);
    }

    #[test]
    fn test_source_failure_propagates_and_tears_down_both() {
        let (left, right, joined) = fixture();
        let (events, _keep) = collect(&joined);

        left.fail(Error::callback("left broke"));
        // the surviving side is detached, its events can no longer arrive
        assert_eq!(right.subscriber_count(), 0);
        right.push_insert(10, "ops").unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Failed(_)));
    }

    #[test]
    fn test_callback_error_fails_output_and_unsubscribes_sources() {
        let left: TableSubject<u32, u32> = TableSubject::new();
        let right: TableSubject<u32, &'static str> = TableSubject::new();
        let joined = left_join(
            &left.stream(),
            &right.stream(),
            |_: &u32| Err(Error::callback("bad key")),
            |_: &u32, _: Option<&&'static str>| Ok(0u32),
        );
        let (events, _keep) = collect(&joined);

        left.push_insert(1, 7).unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            StreamEvent::Failed(Error::callback("bad key"))
        );
    }

    #[test]
    fn test_unsubscribe_releases_both_sources() {
        let left_hub: Subject<UpdateBatch<u32, (u32, Option<u32>)>> = Subject::new();
        let right_hub: Subject<UpdateBatch<u32, &'static str>> = Subject::new();
        let joined = left_join(
            &left_hub.stream(),
            &right_hub.stream(),
            |row: &(u32, Option<u32>)| Ok(row.1),
            |row: &(u32, Option<u32>), dept: Option<&&'static str>| Ok((row.0, dept.copied())),
        );

        let subscription = joined.subscribe(|_| {});
        assert_eq!(left_hub.subscriber_count(), 1);
        assert_eq!(right_hub.subscriber_count(), 1);

        subscription.unsubscribe();
        assert_eq!(left_hub.subscriber_count(), 0);
        assert_eq!(right_hub.subscriber_count(), 0);
    }

    #[test]
    fn test_synchronous_sources_join_to_completion() {
        let left = from_entries(vec![(1u32, (1u32, Some(10u32))), (2, (2, None))]);
        let right = from_entries(vec![(10u32, "ops")]);
        let joined = left_join(
            &left,
            &right,
            |row: &(u32, Option<u32>)| Ok(row.1),
            |row: &(u32, Option<u32>), dept: Option<&&'static str>| Ok((row.0, dept.copied())),
        );
        let (events, _keep) = collect(&joined);

        let events = events.borrow();
        let out = batches(&events);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[1].changes,
            [RowChange::update(1, (1, None), (1, Some("ops")))]
        );
        assert_eq!(events.last(), Some(&StreamEvent::Completed));
    }
}
