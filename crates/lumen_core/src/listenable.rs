//! Ordered listener lists with snapshot notification
//!
//! A [`ListenerList`] stores callbacks behind opaque slotmap handles. The
//! handle returned from [`ListenerList::add`] is the subscription's identity:
//! callers keep it and hand it back to [`ListenerList::remove`].
//!
//! Notification always iterates a snapshot taken when the pass begins, so a
//! callback may add or remove listeners (including itself) without affecting
//! the pass in progress. The change is visible on the next pass.
//!
//! ```rust
//! use lumen_core::listenable::{ListenerId, ListenerList};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let list: ListenerList<ListenerId, dyn Fn()> = ListenerList::new();
//! let hits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&hits);
//! let id = list.add(Rc::new(move || counter.set(counter.get() + 1)));
//!
//! list.notify();
//! assert_eq!(hits.get(), 1);
//!
//! assert!(list.remove(id));
//! list.notify();
//! assert_eq!(hits.get(), 1);
//! ```

use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

new_key_type! {
    /// Handle to a registered value listener
    pub struct ListenerId;
    /// Handle to a registered status listener
    pub struct StatusListenerId;
}

struct Slots<K: Key, F: ?Sized> {
    callbacks: SlotMap<K, Rc<F>>,
    /// Registration order; slotmap iteration order follows slot reuse instead
    order: SmallVec<[K; 4]>,
}

/// An insertion-ordered set of callbacks keyed by slotmap handles
pub struct ListenerList<K: Key, F: ?Sized> {
    slots: RefCell<Slots<K, F>>,
}

impl<K: Key, F: ?Sized> ListenerList<K, F> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Slots {
                callbacks: SlotMap::with_key(),
                order: SmallVec::new(),
            }),
        }
    }

    /// Register a callback and return its handle
    ///
    /// Every call yields a fresh handle, so the same closure registered twice
    /// is two independent subscriptions.
    pub fn add(&self, callback: Rc<F>) -> K {
        let mut slots = self.slots.borrow_mut();
        let id = slots.callbacks.insert(callback);
        slots.order.push(id);
        id
    }

    /// Remove a callback. Returns `false` if the handle was not registered.
    pub fn remove(&self, id: K) -> bool {
        let mut slots = self.slots.borrow_mut();
        if slots.callbacks.remove(id).is_none() {
            return false;
        }
        slots.order.retain(|k| *k != id);
        true
    }

    pub fn contains(&self, id: K) -> bool {
        self.slots.borrow().callbacks.contains_key(id)
    }

    /// Copy the current callbacks in registration order
    pub fn snapshot(&self) -> SmallVec<[Rc<F>; 4]> {
        let slots = self.slots.borrow();
        slots
            .order
            .iter()
            .filter_map(|id| slots.callbacks.get(*id).cloned())
            .collect()
    }

    /// Drop every registration
    pub fn clear(&self) {
        let mut slots = self.slots.borrow_mut();
        slots.callbacks.clear();
        slots.order.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Key, F: ?Sized> Default for ListenerList<K, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> ListenerList<K, dyn Fn()> {
    /// Call every listener registered when the pass begins
    pub fn notify(&self) {
        let snapshot = self.snapshot();
        tracing::trace!("notifying {} listeners", snapshot.len());
        for callback in snapshot {
            callback();
        }
    }
}

impl<K: Key, A: Clone> ListenerList<K, dyn Fn(A)> {
    /// Call every listener registered when the pass begins with `arg`
    pub fn notify_with(&self, arg: A) {
        let snapshot = self.snapshot();
        tracing::trace!("notifying {} listeners", snapshot.len());
        for callback in snapshot {
            callback(arg.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Rc<dyn Fn()>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| -> Rc<dyn Fn()> {
            let sink = Rc::clone(&sink);
            Rc::new(move || sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_notify_in_registration_order() {
        let list: ListenerList<ListenerId, dyn Fn()> = ListenerList::new();
        let (log, make) = recorder();

        let a = list.add(make("a"));
        list.add(make("b"));
        list.remove(a);
        // Reuses a's slot but must still come last
        list.add(make("c"));

        list.notify();
        assert_eq!(*log.borrow(), vec!["b", "c"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let list: ListenerList<ListenerId, dyn Fn()> = ListenerList::new();
        let id = list.add(Rc::new(|| {}));
        assert!(list.remove(id));
        assert!(!list.remove(id));
        assert!(list.is_empty());
    }

    #[test]
    fn test_same_closure_twice_is_two_subscriptions() {
        let list: ListenerList<ListenerId, dyn Fn()> = ListenerList::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let callback: Rc<dyn Fn()> = Rc::new(move || counter.set(counter.get() + 1));

        let first = list.add(Rc::clone(&callback));
        let second = list.add(callback);
        assert_ne!(first, second);

        list.notify();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_mutation_during_notify_applies_next_pass() {
        let list: Rc<ListenerList<ListenerId, dyn Fn()>> = Rc::new(ListenerList::new());
        let (log, make) = recorder();

        let victim = list.add(make("victim"));
        let late: Rc<dyn Fn()> = make("late");

        let list_ref = Rc::downgrade(&list);
        list.add(Rc::new(move || {
            if let Some(list) = list_ref.upgrade() {
                list.remove(victim);
                list.add(Rc::clone(&late));
            }
        }));

        list.notify();
        // The snapshot still contains the victim and not the late listener
        assert_eq!(*log.borrow(), vec!["victim"]);

        log.borrow_mut().clear();
        list.notify();
        assert_eq!(*log.borrow(), vec!["late"]);
    }

    #[test]
    fn test_notify_with_argument() {
        let list: ListenerList<StatusListenerId, dyn Fn(u32)> = ListenerList::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        list.add(Rc::new(move |v: u32| sink.borrow_mut().push(v)));

        list.notify_with(7);
        list.notify_with(9);
        assert_eq!(*seen.borrow(), vec![7, 9]);
    }

    #[test]
    fn test_clear() {
        let list: ListenerList<ListenerId, dyn Fn()> = ListenerList::new();
        let id = list.add(Rc::new(|| {}));
        list.add(Rc::new(|| {}));
        assert_eq!(list.len(), 2);

        list.clear();
        assert!(list.is_empty());
        assert!(!list.contains(id));
    }
}
