//! Hot subjects: push sources driven by hand.
//!
//! A [`Subject`] fans pushed events out to whoever is subscribed at that
//! moment; late subscribers miss earlier events. A [`TableSubject`] layers an
//! internally maintained table index on top, so fixtures can push raw row
//! changes and get well-formed snapshot+diff batches out.

use crate::stream::{Sink, Stream, StreamEvent, TableStream};
use crate::subscription::Subscription;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::hash::Hash;
use tabula_core::{Error, Result, RowChange, TableSnapshot, UpdateBatch};

struct SubjectInner<T> {
    /// Subscribed sinks in subscription order. Delivery iterates a snapshot
    /// of this list, so subscribers may unsubscribe mid-delivery.
    sinks: RefCell<Vec<(u64, Sink<T>)>>,
    next_id: Cell<u64>,
    /// Set to the terminal event once the subject ends; replayed to late
    /// subscribers.
    terminal: RefCell<Option<StreamEvent<T>>>,
}

/// A hot multicast event source.
pub struct Subject<T> {
    inner: Rc<SubjectInner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Subject<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(SubjectInner {
                sinks: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                terminal: RefCell::new(None),
            }),
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// Creates a live subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream view of this subject. Subscribing registers a sink; a
    /// subscriber arriving after the subject ended receives the terminal
    /// event immediately.
    pub fn stream(&self) -> Stream<T> {
        let inner = Rc::clone(&self.inner);
        Stream::create(move |sink| {
            // replay outside the borrow; the callback may reach back into
            // this subject
            let terminal = inner.terminal.borrow().clone();
            if let Some(terminal) = terminal {
                match terminal {
                    StreamEvent::Failed(error) => sink.fail(error),
                    _ => sink.complete(),
                }
                return Subscription::empty();
            }

            let id = inner.next_id.get();
            inner.next_id.set(id + 1);
            inner.sinks.borrow_mut().push((id, sink));

            let inner = Rc::clone(&inner);
            Subscription::new(move || {
                inner.sinks.borrow_mut().retain(|(sink_id, _)| *sink_id != id);
            })
        })
    }

    /// Pushes the next element to all current subscribers.
    pub fn next(&self, item: T) {
        if self.inner.terminal.borrow().is_some() {
            return;
        }
        for sink in self.current_sinks() {
            sink.next(item.clone());
        }
    }

    /// Ends the subject with a failure.
    pub fn fail(&self, error: Error) {
        if self.inner.terminal.borrow().is_some() {
            return;
        }
        *self.inner.terminal.borrow_mut() = Some(StreamEvent::Failed(error.clone()));
        for sink in self.detach_sinks() {
            sink.fail(error.clone());
        }
    }

    /// Ends the subject with completion.
    pub fn complete(&self) {
        if self.inner.terminal.borrow().is_some() {
            return;
        }
        *self.inner.terminal.borrow_mut() = Some(StreamEvent::Completed);
        for sink in self.detach_sinks() {
            sink.complete();
        }
    }

    /// Number of currently subscribed sinks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.sinks.borrow().len()
    }

    /// A sink that forwards every event into this subject; used to connect a
    /// subject to an upstream stream.
    pub(crate) fn sink(&self) -> Sink<T> {
        let subject = self.clone();
        Sink::new(move |event| match event {
            StreamEvent::Next(item) => subject.next(item),
            StreamEvent::Failed(error) => subject.fail(error),
            StreamEvent::Completed => subject.complete(),
        })
    }

    fn current_sinks(&self) -> Vec<Sink<T>> {
        self.inner
            .sinks
            .borrow()
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect()
    }

    fn detach_sinks(&self) -> Vec<Sink<T>> {
        self.inner
            .sinks
            .borrow_mut()
            .drain(..)
            .map(|(_, sink)| sink)
            .collect()
    }
}

/// Manual-injection table source for building verification fixtures.
///
/// Pushed change lists are folded onto an internally maintained index (so
/// contract violations surface as errors at the push site) and re-emitted as
/// full [`UpdateBatch`]es.
pub struct TableSubject<K, V> {
    subject: Subject<UpdateBatch<K, V>>,
    index: RefCell<TableSnapshot<K, V>>,
}

impl<K, V> Default for TableSubject<K, V> {
    fn default() -> Self {
        Self {
            subject: Subject::default(),
            index: RefCell::new(TableSnapshot::default()),
        }
    }
}

impl<K, V> TableSubject<K, V>
where
    K: Eq + Hash + Clone + 'static,
    V: Clone + 'static,
{
    /// Creates an empty table subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live batch stream fed by this subject.
    pub fn stream(&self) -> TableStream<K, V> {
        self.subject.stream()
    }

    /// The current table index.
    pub fn index(&self) -> TableSnapshot<K, V> {
        self.index.borrow().clone()
    }

    /// Pushes an ordered change list as one batch.
    pub fn push(&self, changes: Vec<RowChange<K, V>>) -> Result<()> {
        let next = self.index.borrow().apply(&changes)?;
        *self.index.borrow_mut() = next.clone();
        self.subject.next(UpdateBatch::new(next, changes));
        Ok(())
    }

    /// Pushes a single insert.
    pub fn push_insert(&self, key: K, value: V) -> Result<()> {
        self.push(vec![RowChange::insert(key, value)])
    }

    /// Pushes an update, deriving the previous value from the current index.
    pub fn push_update(&self, key: K, value: V) -> Result<()> {
        let previous = self
            .index
            .borrow()
            .get(&key)
            .cloned()
            .ok_or(Error::key_not_found("table subject index"))?;
        self.push(vec![RowChange::update(key, previous, value)])
    }

    /// Pushes a delete, deriving the removed value from the current index.
    pub fn push_delete(&self, key: K) -> Result<()> {
        let previous = self
            .index
            .borrow()
            .get(&key)
            .cloned()
            .ok_or(Error::key_not_found("table subject index"))?;
        self.push(vec![RowChange::delete(key, previous)])
    }

    /// Number of currently subscribed sinks.
    pub fn subscriber_count(&self) -> usize {
        self.subject.subscriber_count()
    }

    /// Completes the stream.
    pub fn complete(&self) {
        self.subject.complete();
    }

    /// Fails the stream.
    pub fn fail(&self, error: Error) {
        self.subject.fail(error);
    }
}
