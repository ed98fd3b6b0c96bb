//! Subscription handles for push streams.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::mem;

/// Teardown handle for an active stream subscription.
///
/// Unsubscribing runs the registered teardown exactly once; repeated calls
/// are no-ops. Dropping the handle unsubscribes, so fixtures keep the handle
/// alive for as long as they want output.
pub struct Subscription {
    teardown: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Creates a subscription with the given teardown action.
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        let mut actions: Vec<Box<dyn FnOnce()>> = Vec::with_capacity(1);
        actions.push(Box::new(teardown));
        Self {
            teardown: RefCell::new(actions),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self {
            teardown: RefCell::new(Vec::new()),
        }
    }

    /// Combines two subscriptions; unsubscribing the result tears down both.
    pub fn and(self, other: Subscription) -> Self {
        let mut actions = Vec::new();
        actions.append(&mut self.teardown.borrow_mut());
        actions.append(&mut other.teardown.borrow_mut());
        Self {
            teardown: RefCell::new(actions),
        }
    }

    /// Tears down the subscription. Idempotent.
    pub fn unsubscribe(&self) {
        // take first so a teardown action re-entering here sees nothing left
        let actions = mem::take(&mut *self.teardown.borrow_mut());
        for action in actions {
            action();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::Cell;

    #[test]
    fn test_unsubscribe_runs_teardown_once() {
        let count = Rc::new(Cell::new(0));
        let counted = count.clone();

        let subscription = Subscription::new(move || counted.set(counted.get() + 1));
        subscription.unsubscribe();
        subscription.unsubscribe();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let count = Rc::new(Cell::new(0));
        let counted = count.clone();

        {
            let _subscription = Subscription::new(move || counted.set(counted.get() + 1));
        }

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_and_tears_down_both() {
        let count = Rc::new(Cell::new(0));
        let first = count.clone();
        let second = count.clone();

        let combined = Subscription::new(move || first.set(first.get() + 1))
            .and(Subscription::new(move || second.set(second.get() + 10)));
        combined.unsubscribe();

        assert_eq!(count.get(), 11);
    }

    #[test]
    fn test_empty_is_inert() {
        let subscription = Subscription::empty();
        subscription.unsubscribe();
    }
}
