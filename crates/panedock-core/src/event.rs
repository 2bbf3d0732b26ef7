//! Listener registry for lifecycle notifications.
//!
//! # Design
//!
//! [`EventEmitter<E>`] keeps listeners as weak references; the strong side
//! lives in the [`Subscription`] guard handed back by
//! [`EventEmitter::subscribe`]. Dropping the guard unsubscribes, and dead
//! entries are pruned lazily on the next [`EventEmitter::emit`].
//!
//! Notifications are fire-and-forget: listeners run synchronously in
//! registration order and cannot fail the operation that produced the event.

use std::fmt;
use std::rc::{Rc, Weak};

type ListenerRc<E> = Rc<dyn Fn(&E)>;
type ListenerWeak<E> = Weak<dyn Fn(&E)>;

/// Ordered set of weakly held listeners for events of type `E`.
pub struct EventEmitter<E> {
    listeners: Vec<ListenerWeak<E>>,
    emitted: u64,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            emitted: 0,
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listener_count", &self.listeners.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}

impl<E: 'static> EventEmitter<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Keep the returned guard alive for as long as the
    /// listener should receive events.
    pub fn subscribe(&mut self, listener: impl Fn(&E) + 'static) -> Subscription {
        let strong: ListenerRc<E> = Rc::new(listener);
        self.listeners.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver one event to every live listener.
    pub fn emit(&mut self, event: &E) {
        self.listeners.retain(|listener| listener.strong_count() > 0);
        let live: Vec<ListenerRc<E>> = self.listeners.iter().filter_map(Weak::upgrade).collect();
        self.emitted = self.emitted.saturating_add(1);
        for listener in live {
            listener(event);
        }
    }

    /// Deliver a batch of events in order.
    pub fn emit_all(&mut self, events: &[E]) {
        for event in events {
            self.emit(event);
        }
    }

    /// Registered listeners, including dead ones not yet pruned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total number of events emitted so far.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// RAII guard for a listener registered on an [`EventEmitter`].
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn listeners_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::<u32>::new();

        let a = Rc::clone(&seen);
        let _first = emitter.subscribe(move |v| a.borrow_mut().push(("a", *v)));
        let b = Rc::clone(&seen);
        let _second = emitter.subscribe(move |v| b.borrow_mut().push(("b", *v)));

        emitter.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
        assert_eq!(emitter.emitted(), 1);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let count = Rc::new(RefCell::new(0));
        let mut emitter = EventEmitter::<()>::new();
        let c = Rc::clone(&count);
        let guard = emitter.subscribe(move |()| *c.borrow_mut() += 1);

        emitter.emit(&());
        drop(guard);
        emitter.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn emit_all_preserves_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::<&'static str>::new();
        let s = Rc::clone(&seen);
        let _guard = emitter.subscribe(move |v| s.borrow_mut().push(*v));
        emitter.emit_all(&["added", "removed"]);
        assert_eq!(*seen.borrow(), vec!["added", "removed"]);
    }
}
