//! The `Animation` interface and derived animations
//!
//! An [`Animation<T>`] is anything that has a current value, a status and two
//! kinds of listeners. [`AnimationController`](crate::AnimationController) is
//! the root implementation; the types here wrap a parent animation and change
//! how its value (or status) reads without owning any state of their own:
//!
//! - [`DerivedAnimation`]: any pure function of the parent's value
//! - [`CurvedAnimation`]: the parent's value eased by a [`Curve`]
//! - [`ReverseAnimation`]: `1 - value`, with flipped statuses
//!
//! Listeners registered on a derived animation are registered on the parent,
//! so the handles they return are the parent's handles.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use lumen_core::listenable::{ListenerId, ListenerList, StatusListenerId};

use crate::curve::Curve;
use crate::status::AnimationStatus;

/// Value and status listener sets of one animation
#[derive(Default)]
pub struct AnimationListeners {
    listeners: ListenerList<ListenerId, dyn Fn()>,
    status_listeners: ListenerList<StatusListenerId, dyn Fn(AnimationStatus)>,
}

impl AnimationListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Rc<dyn Fn()>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn notify_listeners(&self) {
        self.listeners.notify();
    }

    pub fn clear_listeners(&self) {
        self.listeners.clear();
    }

    pub fn add_status_listener(&self, listener: Rc<dyn Fn(AnimationStatus)>) -> StatusListenerId {
        self.status_listeners.add(listener)
    }

    pub fn remove_status_listener(&self, id: StatusListenerId) -> bool {
        self.status_listeners.remove(id)
    }

    pub fn notify_status_listeners(&self, status: AnimationStatus) {
        self.status_listeners.notify_with(status);
    }

    pub fn clear_status_listeners(&self) {
        self.status_listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn status_listener_count(&self) -> usize {
        self.status_listeners.len()
    }
}

/// A value of type `T` that changes over time
pub trait Animation<T> {
    fn value(&self) -> T;

    fn status(&self) -> AnimationStatus;

    /// Call `listener` whenever the value changes
    fn add_listener(&self, listener: Box<dyn Fn()>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Call `listener` whenever the status changes
    fn add_status_listener(&self, listener: Box<dyn Fn(AnimationStatus)>) -> StatusListenerId;

    fn remove_status_listener(&self, id: StatusListenerId) -> bool;

    fn is_dismissed(&self) -> bool {
        self.status().is_dismissed()
    }

    fn is_completed(&self) -> bool {
        self.status().is_completed()
    }

    fn is_animating(&self) -> bool {
        self.status().is_animating()
    }

    fn is_forward_or_completed(&self) -> bool {
        self.status().is_forward_or_completed()
    }
}

/// A pure function of a parent animation's value
pub struct DerivedAnimation<T> {
    parent: Rc<dyn Animation<f64>>,
    transform: Rc<dyn Fn(f64) -> T>,
}

impl<T> DerivedAnimation<T> {
    pub fn new(parent: Rc<dyn Animation<f64>>, transform: impl Fn(f64) -> T + 'static) -> Self {
        Self {
            parent,
            transform: Rc::new(transform),
        }
    }

    pub fn parent(&self) -> &Rc<dyn Animation<f64>> {
        &self.parent
    }
}

impl<T> Clone for DerivedAnimation<T> {
    fn clone(&self) -> Self {
        Self {
            parent: Rc::clone(&self.parent),
            transform: Rc::clone(&self.transform),
        }
    }
}

impl<T> Animation<T> for DerivedAnimation<T> {
    fn value(&self) -> T {
        (self.transform)(self.parent.value())
    }

    fn status(&self) -> AnimationStatus {
        self.parent.status()
    }

    fn add_listener(&self, listener: Box<dyn Fn()>) -> ListenerId {
        self.parent.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.parent.remove_listener(id)
    }

    fn add_status_listener(&self, listener: Box<dyn Fn(AnimationStatus)>) -> StatusListenerId {
        self.parent.add_status_listener(listener)
    }

    fn remove_status_listener(&self, id: StatusListenerId) -> bool {
        self.parent.remove_status_listener(id)
    }
}

impl<T> fmt::Debug for DerivedAnimation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedAnimation")
            .field("status", &self.parent.status())
            .finish_non_exhaustive()
    }
}

/// A parent animation's value eased by a curve
///
/// With a `reverse_curve`, runs that start in reverse use it instead of the
/// forward curve. A run keeps the curve it started with even if the parent
/// changes direction midway, so the value does not jump.
///
/// The parent's value must stay within `[0, 1]`.
pub struct CurvedAnimation {
    parent: Rc<dyn Animation<f64>>,
    curve: Rc<dyn Curve>,
    reverse_curve: Option<Rc<dyn Curve>>,
    /// Direction of the run in progress, `None` while at rest
    curve_direction: Rc<Cell<Option<AnimationStatus>>>,
    status_subscription: StatusListenerId,
}

impl CurvedAnimation {
    pub fn new(parent: Rc<dyn Animation<f64>>, curve: impl Curve + 'static) -> Self {
        Self::build(parent, Rc::new(curve), None)
    }

    pub fn with_reverse_curve(
        parent: Rc<dyn Animation<f64>>,
        curve: impl Curve + 'static,
        reverse_curve: impl Curve + 'static,
    ) -> Self {
        Self::build(parent, Rc::new(curve), Some(Rc::new(reverse_curve)))
    }

    fn build(
        parent: Rc<dyn Animation<f64>>,
        curve: Rc<dyn Curve>,
        reverse_curve: Option<Rc<dyn Curve>>,
    ) -> Self {
        let curve_direction = Rc::new(Cell::new(None));
        Self::update_curve_direction(&curve_direction, parent.status());

        let tracked = Rc::clone(&curve_direction);
        let status_subscription = parent.add_status_listener(Box::new(move |status| {
            Self::update_curve_direction(&tracked, status);
        }));

        Self {
            parent,
            curve,
            reverse_curve,
            curve_direction,
            status_subscription,
        }
    }

    fn update_curve_direction(direction: &Cell<Option<AnimationStatus>>, status: AnimationStatus) {
        let next = match status {
            AnimationStatus::Dismissed | AnimationStatus::Completed => None,
            AnimationStatus::Forward | AnimationStatus::Reverse => direction.get().or(Some(status)),
        };
        direction.set(next);
    }

    fn uses_forward_curve(&self) -> bool {
        self.reverse_curve.is_none()
            || self.curve_direction.get().unwrap_or_else(|| self.parent.status())
                != AnimationStatus::Reverse
    }
}

impl Animation<f64> for CurvedAnimation {
    fn value(&self) -> f64 {
        let t = self.parent.value();
        let curve = match &self.reverse_curve {
            Some(reverse) if !self.uses_forward_curve() => reverse,
            _ => &self.curve,
        };
        curve.transform(t)
    }

    fn status(&self) -> AnimationStatus {
        self.parent.status()
    }

    fn add_listener(&self, listener: Box<dyn Fn()>) -> ListenerId {
        self.parent.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.parent.remove_listener(id)
    }

    fn add_status_listener(&self, listener: Box<dyn Fn(AnimationStatus)>) -> StatusListenerId {
        self.parent.add_status_listener(listener)
    }

    fn remove_status_listener(&self, id: StatusListenerId) -> bool {
        self.parent.remove_status_listener(id)
    }
}

impl Drop for CurvedAnimation {
    fn drop(&mut self) {
        self.parent.remove_status_listener(self.status_subscription);
    }
}

impl fmt::Debug for CurvedAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurvedAnimation")
            .field("status", &self.parent.status())
            .field("curve_direction", &self.curve_direction.get())
            .finish_non_exhaustive()
    }
}

/// `1 - parent`, running the other way
///
/// Status listeners receive the flipped status: when the parent completes,
/// this animation is dismissed.
#[derive(Clone)]
pub struct ReverseAnimation {
    parent: Rc<dyn Animation<f64>>,
}

impl ReverseAnimation {
    pub fn new(parent: Rc<dyn Animation<f64>>) -> Self {
        Self { parent }
    }
}

impl Animation<f64> for ReverseAnimation {
    fn value(&self) -> f64 {
        1.0 - self.parent.value()
    }

    fn status(&self) -> AnimationStatus {
        self.parent.status().flipped()
    }

    fn add_listener(&self, listener: Box<dyn Fn()>) -> ListenerId {
        self.parent.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.parent.remove_listener(id)
    }

    fn add_status_listener(&self, listener: Box<dyn Fn(AnimationStatus)>) -> StatusListenerId {
        self.parent
            .add_status_listener(Box::new(move |status| listener(status.flipped())))
    }

    fn remove_status_listener(&self, id: StatusListenerId) -> bool {
        self.parent.remove_status_listener(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// A hand-driven animation for exercising the wrappers
    #[derive(Default)]
    struct ManualAnimation {
        value: Cell<f64>,
        status: Cell<Option<AnimationStatus>>,
        listeners: AnimationListeners,
    }

    impl ManualAnimation {
        fn set(&self, value: f64, status: AnimationStatus) {
            self.value.set(value);
            self.listeners.notify_listeners();
            if self.status.replace(Some(status)) != Some(status) {
                self.listeners.notify_status_listeners(status);
            }
        }
    }

    impl Animation<f64> for ManualAnimation {
        fn value(&self) -> f64 {
            self.value.get()
        }

        fn status(&self) -> AnimationStatus {
            self.status.get().unwrap_or(AnimationStatus::Dismissed)
        }

        fn add_listener(&self, listener: Box<dyn Fn()>) -> ListenerId {
            self.listeners.add_listener(Rc::from(listener))
        }

        fn remove_listener(&self, id: ListenerId) -> bool {
            self.listeners.remove_listener(id)
        }

        fn add_status_listener(&self, listener: Box<dyn Fn(AnimationStatus)>) -> StatusListenerId {
            self.listeners.add_status_listener(Rc::from(listener))
        }

        fn remove_status_listener(&self, id: StatusListenerId) -> bool {
            self.listeners.remove_status_listener(id)
        }
    }

    #[test]
    fn test_derived_animation_maps_value() {
        let parent = Rc::new(ManualAnimation::default());
        let derived = DerivedAnimation::new(parent.clone(), |v| format!("{:.0}%", v * 100.0));

        parent.set(0.25, AnimationStatus::Forward);
        assert_eq!(derived.value(), "25%");
        assert_eq!(derived.status(), AnimationStatus::Forward);
    }

    #[test]
    fn test_listeners_forward_to_parent() {
        let parent = Rc::new(ManualAnimation::default());
        let derived = DerivedAnimation::new(parent.clone(), |v| v * 2.0);

        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = derived.add_listener(Box::new(move || counter.set(counter.get() + 1)));

        parent.set(0.5, AnimationStatus::Forward);
        assert_eq!(hits.get(), 1);

        assert!(parent.remove_listener(id));
        parent.set(0.6, AnimationStatus::Forward);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_reverse_animation_flips() {
        let parent = Rc::new(ManualAnimation::default());
        let reversed = ReverseAnimation::new(parent.clone());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        reversed.add_status_listener(Box::new(move |status| sink.borrow_mut().push(status)));

        parent.set(0.3, AnimationStatus::Forward);
        parent.set(1.0, AnimationStatus::Completed);

        assert!((reversed.value() - 0.0).abs() < 1e-12);
        assert!(reversed.is_dismissed());
        assert_eq!(
            *seen.borrow(),
            vec![AnimationStatus::Reverse, AnimationStatus::Dismissed]
        );
    }

    #[test]
    fn test_curved_animation_keeps_run_curve() {
        use crate::curve::{Cubic, Linear};

        let parent = Rc::new(ManualAnimation::default());
        let curved = CurvedAnimation::with_reverse_curve(parent.clone(), Cubic::EASE_IN, Linear);

        parent.set(0.5, AnimationStatus::Forward);
        assert_eq!(curved.value(), Cubic::EASE_IN.transform(0.5));

        // Interrupting with a reverse keeps the forward curve for this run
        parent.set(0.4, AnimationStatus::Reverse);
        assert_eq!(curved.value(), Cubic::EASE_IN.transform(0.4));

        // A run that starts in reverse uses the reverse curve
        parent.set(0.0, AnimationStatus::Dismissed);
        parent.set(1.0, AnimationStatus::Completed);
        parent.set(0.4, AnimationStatus::Reverse);
        assert_eq!(curved.value(), 0.4);
    }

    #[test]
    fn test_curved_animation_unsubscribes_on_drop() {
        use crate::curve::Linear;

        let parent = Rc::new(ManualAnimation::default());
        let curved = CurvedAnimation::new(parent.clone(), Linear);
        assert_eq!(parent.listeners.status_listener_count(), 1);
        drop(curved);
        assert_eq!(parent.listeners.status_listener_count(), 0);
    }
}
