//! Cold push streams and their event sinks.
//!
//! A [`Stream`] is a subscribe function: each subscription runs the producer
//! afresh with its own sink, so per-subscription state (reducer indexes, join
//! state) is never shared or resumed. Hot sharing is introduced explicitly by
//! [`crate::Subject`] and [`crate::operators::publish`].
//!
//! Delivery is single-threaded and synchronous; sources must never deliver
//! two notifications concurrently. There is no buffering and no backpressure:
//! a slow consumer simply lengthens the call chain that produced the event.

use crate::subscription::Subscription;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use tabula_core::{Error, UpdateBatch};

/// One notification on a push stream.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent<T> {
    /// The next element.
    Next(T),
    /// Terminal failure; nothing follows.
    Failed(Error),
    /// Terminal completion; nothing follows.
    Completed,
}

impl<T> StreamEvent<T> {
    /// Returns true for `Failed` and `Completed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Next(_))
    }
}

/// Event inlet handed to a stream producer.
///
/// Clones share one terminal latch: once `fail` or `complete` has been
/// delivered, every further event is discarded, enforcing the event grammar
/// `Next* (Failed | Completed)`.
pub struct Sink<T> {
    deliver: Rc<RefCell<dyn FnMut(StreamEvent<T>)>>,
    terminated: Rc<Cell<bool>>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            deliver: Rc::clone(&self.deliver),
            terminated: Rc::clone(&self.terminated),
        }
    }
}

impl<T> Sink<T> {
    /// Wraps an event callback as a sink.
    pub fn new(deliver: impl FnMut(StreamEvent<T>) + 'static) -> Self {
        Self {
            deliver: Rc::new(RefCell::new(deliver)),
            terminated: Rc::new(Cell::new(false)),
        }
    }

    /// Delivers the next element, unless the sink has terminated.
    pub fn next(&self, item: T) {
        if !self.terminated.get() {
            (&mut *self.deliver.borrow_mut())(StreamEvent::Next(item));
        }
    }

    /// Delivers a terminal failure and latches the sink.
    pub fn fail(&self, error: Error) {
        if !self.terminated.get() {
            self.terminated.set(true);
            (&mut *self.deliver.borrow_mut())(StreamEvent::Failed(error));
        }
    }

    /// Delivers completion and latches the sink.
    pub fn complete(&self) {
        if !self.terminated.get() {
            self.terminated.set(true);
            (&mut *self.deliver.borrow_mut())(StreamEvent::Completed);
        }
    }

    /// Returns true once a terminal event has been delivered.
    pub fn is_terminated(&self) -> bool {
        self.terminated.get()
    }
}

/// A cold push stream of `T` values.
pub struct Stream<T> {
    producer: Rc<dyn Fn(Sink<T>) -> Subscription>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T: 'static> Stream<T> {
    /// Creates a stream from a producer run once per subscription.
    ///
    /// The producer receives the subscriber's sink and returns the
    /// subscription that tears its work down.
    pub fn create(producer: impl Fn(Sink<T>) -> Subscription + 'static) -> Self {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Subscribes with an event callback.
    pub fn subscribe(&self, callback: impl FnMut(StreamEvent<T>) + 'static) -> Subscription {
        self.attach(Sink::new(callback))
    }

    /// Connects an existing sink to this stream.
    pub(crate) fn attach(&self, sink: Sink<T>) -> Subscription {
        (self.producer)(sink)
    }
}

/// A stream of keyed snapshot+diff batches; the shape every table operator
/// consumes and produces.
pub type TableStream<K, V> = Stream<UpdateBatch<K, V>>;
