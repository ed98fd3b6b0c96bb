//! Deferred-start multicast relay.

use crate::stream::Stream;
use crate::subject::Subject;
use alloc::rc::Rc;

/// Multicasts `source` through an internal hub so `selector` can consume it
/// more than once without re-running the upstream.
///
/// Per subscription to the published stream: a fresh hub [`Subject`] is
/// created, `selector` builds the derived pipeline over the hub's stream, the
/// consumer is subscribed to the derived stream, and only then is the hub
/// connected to the upstream. The deferred connection guarantees every arm
/// wired by `selector` is already listening when the upstream starts, and
/// that the upstream runs exactly once per published subscription. Hub
/// delivery follows subscription order, so the arm `selector` wired first
/// sees each event first.
///
/// Tearing down the returned subscription releases the derived pipeline and
/// the upstream connection.
pub fn publish<T, O>(
    source: &Stream<T>,
    selector: impl Fn(&Stream<T>) -> Stream<O> + 'static,
) -> Stream<O>
where
    T: Clone + 'static,
    O: 'static,
{
    let source = source.clone();
    let selector = Rc::new(selector);

    Stream::create(move |sink| {
        let hub = Subject::new();
        let derived = selector(&hub.stream());
        let downstream = derived.attach(sink);
        let connection = source.attach(hub.sink());
        downstream.and(connection)
    })
}
