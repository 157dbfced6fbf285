//! Animation controller
//!
//! An [`AnimationController`] owns a value between two bounds and drives it
//! with a [`Simulation`] on every frame of its [`Ticker`]. Playback methods
//! (`forward`, `reverse`, `animate_to`, `repeat`, `fling`, ...) replace the
//! simulation wholesale and return a [`TickerFuture`] for the new run; the run
//! they interrupt is canceled.
//!
//! # Status
//!
//! Status is derived from the value and the playback direction: `Dismissed` at
//! the lower bound, `Completed` at the upper bound, otherwise `Forward` or
//! `Reverse`. A run that finishes on its own reports the terminal status of
//! its direction. Status listeners only hear about net changes, after the
//! value listeners of the same update.
//!
//! # Example
//!
//! ```rust
//! use lumen_animation::{AnimationController, AnimationScheduler, AnimationStatus};
//! use std::time::Duration;
//!
//! let scheduler = AnimationScheduler::new();
//! let controller = AnimationController::builder()
//!     .duration(Duration::from_millis(300))
//!     .build(&scheduler);
//!
//! let done = controller.forward(None);
//! for _ in 0..3 {
//!     scheduler.advance(Duration::from_millis(100));
//! }
//! assert_eq!(controller.value(), 1.0);
//! assert_eq!(controller.status(), AnimationStatus::Completed);
//! assert!(done.is_complete());
//! ```

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use lumen_core::listenable::{ListenerId, StatusListenerId};

use crate::animation::{Animation, AnimationListeners};
use crate::config::AnimationConfig;
use crate::curve::{Curve, Linear};
use crate::simulation::{
    InterpolationSimulation, RepeatingSimulation, Simulation, SpringDescription, SpringSimulation,
    SpringType, Tolerance,
};
use crate::status::{AnimationBehavior, AnimationDirection, AnimationStatus};
use crate::ticker::{Resolution, Ticker, TickerFuture, TickerProvider};

/// Duration scale applied under reduced motion
const REDUCED_MOTION_DURATION_SCALE: f64 = 0.05;

/// Fling velocity scale applied under reduced motion
const REDUCED_MOTION_FLING_SCALE: f64 = 200.0;

fn default_fling_spring() -> SpringDescription {
    SpringDescription::with_damping_ratio(1.0, 500.0, 1.0)
}

/// Optional arguments of [`AnimationController::animate_to_with`]
#[derive(Clone)]
pub struct AnimateOptions {
    /// Run time; proportional to the distance when absent
    pub duration: Option<Duration>,
    pub curve: Rc<dyn Curve>,
}

impl AnimateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn curve(mut self, curve: impl Curve + 'static) -> Self {
        self.curve = Rc::new(curve);
        self
    }
}

impl Default for AnimateOptions {
    fn default() -> Self {
        Self {
            duration: None,
            curve: Rc::new(Linear),
        }
    }
}

impl fmt::Debug for AnimateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimateOptions")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// Optional arguments of [`AnimationController::repeat_with`]
#[derive(Clone, Debug, Default)]
pub struct RepeatOptions {
    /// Low end of the sweep, the lower bound when absent
    pub min: Option<f64>,
    /// High end of the sweep, the upper bound when absent
    pub max: Option<f64>,
    /// Alternate sweep direction every period
    pub reverse: bool,
    /// Length of one sweep, the controller's duration when absent
    pub period: Option<Duration>,
}

/// Optional arguments of [`AnimationController::fling_with`]
#[derive(Clone, Debug, Default)]
pub struct FlingOptions {
    /// Critically damped `(mass 1, stiffness 500)` when absent
    pub spring: Option<SpringDescription>,
    /// Overrides the controller's behavior for this fling
    pub behavior: Option<AnimationBehavior>,
}

struct ControllerState {
    value: f64,
    status: AnimationStatus,
    last_reported_status: AnimationStatus,
    direction: AnimationDirection,
    duration: Option<Duration>,
    reverse_duration: Option<Duration>,
    simulation: Option<Box<dyn Simulation>>,
    last_elapsed: Option<Duration>,
    disposed: bool,
}

struct ControllerShared {
    state: RefCell<ControllerState>,
    ticker: RefCell<Ticker>,
    listeners: AnimationListeners,
    lower_bound: f64,
    upper_bound: f64,
    behavior: AnimationBehavior,
    debug_label: Option<String>,
}

/// Drives a value between two bounds over time
///
/// A cheap-clone handle: clones control the same animation.
#[derive(Clone)]
pub struct AnimationController {
    shared: Rc<ControllerShared>,
}

/// A non-owning reference to an [`AnimationController`]
#[derive(Clone)]
pub struct WeakAnimationController {
    shared: Weak<ControllerShared>,
}

impl WeakAnimationController {
    pub fn upgrade(&self) -> Option<AnimationController> {
        self.shared
            .upgrade()
            .map(|shared| AnimationController { shared })
    }
}

/// Builder for [`AnimationController`]
#[derive(Clone, Debug)]
pub struct AnimationControllerBuilder {
    value: Option<f64>,
    duration: Option<Duration>,
    reverse_duration: Option<Duration>,
    lower_bound: f64,
    upper_bound: f64,
    behavior: AnimationBehavior,
    debug_label: Option<String>,
}

impl Default for AnimationControllerBuilder {
    fn default() -> Self {
        Self {
            value: None,
            duration: None,
            reverse_duration: None,
            lower_bound: 0.0,
            upper_bound: 1.0,
            behavior: AnimationBehavior::Normal,
            debug_label: None,
        }
    }
}

impl AnimationControllerBuilder {
    /// Initial value, the lower bound by default
    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Duration of runs towards the lower bound; falls back to `duration`
    pub fn reverse_duration(mut self, duration: Duration) -> Self {
        self.reverse_duration = Some(duration);
        self
    }

    pub fn bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn behavior(mut self, behavior: AnimationBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn debug_label(mut self, label: impl Into<String>) -> Self {
        self.debug_label = Some(label.into());
        self
    }

    /// # Panics
    ///
    /// Panics if the lower bound exceeds the upper bound (or either is NaN).
    pub fn build(self, provider: &dyn TickerProvider) -> AnimationController {
        assert!(
            self.lower_bound <= self.upper_bound,
            "AnimationController lower_bound ({}) must not exceed upper_bound ({})",
            self.lower_bound,
            self.upper_bound
        );

        let value = self
            .value
            .unwrap_or(self.lower_bound)
            .clamp(self.lower_bound, self.upper_bound);
        let direction = AnimationDirection::Forward;
        let status = status_for(value, self.lower_bound, self.upper_bound, direction);

        let shared = Rc::new_cyclic(|weak: &Weak<ControllerShared>| {
            let mut ticker = provider.create_ticker(tick_callback(weak.clone()));
            if let Some(label) = &self.debug_label {
                ticker.set_debug_label(label.clone());
            }
            ControllerShared {
                state: RefCell::new(ControllerState {
                    value,
                    status,
                    last_reported_status: status,
                    direction,
                    duration: self.duration,
                    reverse_duration: self.reverse_duration,
                    simulation: None,
                    last_elapsed: None,
                    disposed: false,
                }),
                ticker: RefCell::new(ticker),
                listeners: AnimationListeners::new(),
                lower_bound: self.lower_bound,
                upper_bound: self.upper_bound,
                behavior: self.behavior,
                debug_label: self.debug_label,
            }
        });

        tracing::debug!(
            label = ?shared.debug_label,
            value,
            lower = shared.lower_bound,
            upper = shared.upper_bound,
            "animation controller created"
        );
        AnimationController { shared }
    }
}

fn tick_callback(weak: Weak<ControllerShared>) -> Box<dyn Fn(Duration)> {
    Box::new(move |elapsed| {
        if let Some(shared) = weak.upgrade() {
            AnimationController { shared }.tick(elapsed);
        }
    })
}

fn status_for(
    value: f64,
    lower_bound: f64,
    upper_bound: f64,
    direction: AnimationDirection,
) -> AnimationStatus {
    if value == lower_bound {
        AnimationStatus::Dismissed
    } else if value == upper_bound {
        AnimationStatus::Completed
    } else {
        direction.running_status()
    }
}

impl AnimationController {
    /// A controller over `0.0..=1.0` starting at 0
    pub fn new(provider: &dyn TickerProvider) -> Self {
        Self::builder().build(provider)
    }

    /// A controller without bounds, starting at 0
    ///
    /// Ignores reduced motion, since unbounded values usually track physical
    /// positions.
    pub fn unbounded(provider: &dyn TickerProvider) -> Self {
        Self::builder()
            .bounds(f64::NEG_INFINITY, f64::INFINITY)
            .value(0.0)
            .behavior(AnimationBehavior::Preserve)
            .build(provider)
    }

    pub fn builder() -> AnimationControllerBuilder {
        AnimationControllerBuilder::default()
    }

    /// A controller from a motion token
    pub fn from_config(config: &AnimationConfig, provider: &dyn TickerProvider) -> Self {
        let mut builder = Self::builder()
            .bounds(config.lower_bound, config.upper_bound)
            .behavior(config.behavior);
        if let Some(value) = config.initial_value {
            builder = builder.value(value);
        }
        if let Some(duration) = config.duration() {
            builder = builder.duration(duration);
        }
        if let Some(duration) = config.reverse_duration() {
            builder = builder.reverse_duration(duration);
        }
        if let Some(label) = &config.debug_label {
            builder = builder.debug_label(label.clone());
        }
        builder.build(provider)
    }

    fn state(&self) -> Ref<'_, ControllerState> {
        self.shared.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, ControllerState> {
        self.shared.state.borrow_mut()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn value(&self) -> f64 {
        self.state().value
    }

    /// Stop any run, jump to `value` (clamped) and notify
    pub fn set_value(&self, value: f64) {
        self.assert_not_disposed("set_value");
        let resolution = self.stop_deferred(true);
        self.internal_set_value(value);
        self.shared.listeners.notify_listeners();
        self.check_status_changed();
        resolution.dispatch();
    }

    /// Jump to the lower bound
    pub fn reset(&self) {
        self.assert_not_disposed("reset");
        self.set_value(self.shared.lower_bound);
    }

    pub fn status(&self) -> AnimationStatus {
        self.state().status
    }

    /// Direction of the current (or last) run
    pub fn direction(&self) -> AnimationDirection {
        self.state().direction
    }

    /// Rate of change of the value in units per second, 0 when idle
    pub fn velocity(&self) -> f64 {
        if !self.is_animating() {
            return 0.0;
        }
        let state = self.state();
        match (&state.simulation, state.last_elapsed) {
            (Some(simulation), Some(elapsed)) => simulation.dx(seconds(elapsed)),
            _ => 0.0,
        }
    }

    /// Whether a run is in progress (even if its ticker is muted)
    pub fn is_animating(&self) -> bool {
        self.shared.ticker.borrow().is_active()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.state().duration
    }

    pub fn set_duration(&self, duration: Option<Duration>) {
        self.state_mut().duration = duration;
    }

    pub fn reverse_duration(&self) -> Option<Duration> {
        self.state().reverse_duration
    }

    pub fn set_reverse_duration(&self, duration: Option<Duration>) {
        self.state_mut().reverse_duration = duration;
    }

    pub fn lower_bound(&self) -> f64 {
        self.shared.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.shared.upper_bound
    }

    /// Time since the current run started, as of the last frame
    pub fn last_elapsed_duration(&self) -> Option<Duration> {
        self.state().last_elapsed
    }

    pub fn animation_behavior(&self) -> AnimationBehavior {
        self.shared.behavior
    }

    pub fn debug_label(&self) -> Option<&str> {
        self.shared.debug_label.as_deref()
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    pub fn downgrade(&self) -> WeakAnimationController {
        WeakAnimationController {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Whether two handles control the same animation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn add_listener(&self, listener: impl Fn() + 'static) -> ListenerId {
        self.shared.listeners.add_listener(Rc::new(listener))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove_listener(id)
    }

    pub fn add_status_listener(
        &self,
        listener: impl Fn(AnimationStatus) + 'static,
    ) -> StatusListenerId {
        self.shared.listeners.add_status_listener(Rc::new(listener))
    }

    pub fn remove_status_listener(&self, id: StatusListenerId) -> bool {
        self.shared.listeners.remove_status_listener(id)
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Run towards the upper bound, optionally jumping to `from` first
    ///
    /// # Panics
    ///
    /// Panics if no duration is set or the controller is disposed.
    pub fn forward(&self, from: Option<f64>) -> TickerFuture {
        self.assert_not_disposed("forward");
        assert!(
            self.duration().is_some(),
            "AnimationController.forward() called with no default duration.\n\
             The duration should be set, either in the builder or later, \
             before calling forward()."
        );
        self.state_mut().direction = AnimationDirection::Forward;
        if let Some(from) = from {
            self.set_value(from);
        }
        self.animate_to_internal(self.shared.upper_bound, None, Rc::new(Linear))
    }

    /// Run towards the lower bound, optionally jumping to `from` first
    ///
    /// # Panics
    ///
    /// Panics if neither a duration nor a reverse duration is set, or the
    /// controller is disposed.
    pub fn reverse(&self, from: Option<f64>) -> TickerFuture {
        self.assert_not_disposed("reverse");
        assert!(
            self.duration().is_some() || self.reverse_duration().is_some(),
            "AnimationController.reverse() called with no default duration or reverse_duration.\n\
             The duration or reverse_duration should be set, either in the builder or later, \
             before calling reverse()."
        );
        self.state_mut().direction = AnimationDirection::Reverse;
        if let Some(from) = from {
            self.set_value(from);
        }
        self.animate_to_internal(self.shared.lower_bound, None, Rc::new(Linear))
    }

    /// Run the other way: reverse if running forward or completed, else forward
    pub fn toggle(&self, from: Option<f64>) -> TickerFuture {
        self.assert_not_disposed("toggle");
        let direction = if self.status().is_forward_or_completed() {
            AnimationDirection::Reverse
        } else {
            AnimationDirection::Forward
        };
        match direction {
            AnimationDirection::Forward => assert!(
                self.duration().is_some(),
                "AnimationController.toggle() called with no default duration.\n\
                 The duration should be set before toggling forward."
            ),
            AnimationDirection::Reverse => assert!(
                self.duration().is_some() || self.reverse_duration().is_some(),
                "AnimationController.toggle() called with no default duration or reverse_duration.\n\
                 The duration or reverse_duration should be set before toggling in reverse."
            ),
        }
        self.state_mut().direction = direction;
        if let Some(from) = from {
            self.set_value(from);
        }
        let target = match direction {
            AnimationDirection::Forward => self.shared.upper_bound,
            AnimationDirection::Reverse => self.shared.lower_bound,
        };
        self.animate_to_internal(target, None, Rc::new(Linear))
    }

    /// Run linearly to `target`, reporting a forward run
    pub fn animate_to(&self, target: f64) -> TickerFuture {
        self.animate_to_with(target, AnimateOptions::default())
    }

    /// Run to `target` with an explicit duration and/or curve, reporting a
    /// forward run whichever side of the value `target` is on
    ///
    /// # Panics
    ///
    /// Panics if neither `options.duration` nor a default duration is set, or
    /// the controller is disposed.
    pub fn animate_to_with(&self, target: f64, options: AnimateOptions) -> TickerFuture {
        self.assert_not_disposed("animate_to");
        assert!(
            options.duration.is_some() || self.duration().is_some(),
            "AnimationController.animate_to() called with no explicit duration and no default duration.\n\
             Either the duration argument should be provided, or the duration should be set, \
             either in the builder or later, before calling animate_to()."
        );
        self.state_mut().direction = AnimationDirection::Forward;
        self.animate_to_internal(target, options.duration, options.curve)
    }

    /// Run linearly to `target`, reporting a reverse run
    pub fn animate_back(&self, target: f64) -> TickerFuture {
        self.animate_back_with(target, AnimateOptions::default())
    }

    /// Like [`animate_to_with`](Self::animate_to_with), reporting a reverse run
    pub fn animate_back_with(&self, target: f64, options: AnimateOptions) -> TickerFuture {
        self.assert_not_disposed("animate_back");
        assert!(
            options.duration.is_some()
                || self.duration().is_some()
                || self.reverse_duration().is_some(),
            "AnimationController.animate_back() called with no explicit duration and no default \
             duration or reverse_duration.\n\
             Either the duration argument should be provided, or the duration or reverse_duration \
             should be set before calling animate_back()."
        );
        self.state_mut().direction = AnimationDirection::Reverse;
        self.animate_to_internal(target, options.duration, options.curve)
    }

    fn animate_to_internal(
        &self,
        target: f64,
        duration: Option<Duration>,
        curve: Rc<dyn Curve>,
    ) -> TickerFuture {
        let scale = match self.shared.behavior {
            AnimationBehavior::Normal if self.reduced_motion() => REDUCED_MOTION_DURATION_SCALE,
            AnimationBehavior::Normal | AnimationBehavior::Preserve => 1.0,
        };

        let (value, direction) = {
            let state = self.state();
            (state.value, state.direction)
        };

        let mut simulation_duration = match duration {
            // Simulations run at microsecond resolution
            Some(duration) => Duration::from_micros(duration.as_micros() as u64),
            None => {
                let range = self.shared.upper_bound - self.shared.lower_bound;
                let remaining_fraction = if range.is_finite() && range > 0.0 {
                    (target - value).abs() / range
                } else {
                    1.0
                };
                let state = self.state();
                let direction_duration = match direction {
                    AnimationDirection::Reverse => state.reverse_duration.or(state.duration),
                    AnimationDirection::Forward => state.duration,
                }
                .unwrap_or_default();
                let micros = direction_duration.as_micros() as f64 * remaining_fraction;
                Duration::from_micros(micros.round() as u64)
            }
        };
        if target == value {
            simulation_duration = Duration::ZERO;
        }

        let resolution = self.stop_deferred(true);

        if simulation_duration.is_zero() {
            let moved = {
                let mut state = self.state_mut();
                let moved = state.value != target;
                if moved {
                    state.value = target.clamp(self.shared.lower_bound, self.shared.upper_bound);
                }
                state.status = direction.terminal_status();
                moved
            };
            tracing::debug!(label = ?self.shared.debug_label, target, "jumped to target");
            if moved {
                self.shared.listeners.notify_listeners();
            }
            self.check_status_changed();
            resolution.dispatch();
            return TickerFuture::complete();
        }

        tracing::debug!(
            label = ?self.shared.debug_label,
            from = value,
            target,
            duration = ?simulation_duration,
            scale,
            ?direction,
            "animating"
        );
        let simulation =
            InterpolationSimulation::new(value, target, simulation_duration, curve, scale);
        let future = self.start_simulation(Box::new(simulation));
        resolution.dispatch();
        future
    }

    /// Sweep between the bounds until stopped
    pub fn repeat(&self) -> TickerFuture {
        self.repeat_with(RepeatOptions::default())
    }

    /// Sweep between `min` and `max` until stopped
    ///
    /// The sweep starts from the current value, so repeating again after a
    /// stop continues in phase. The returned future never completes on its
    /// own; stopping cancels it.
    ///
    /// # Panics
    ///
    /// Panics if there is no period, the range is inverted or outside the
    /// bounds, or the controller is disposed.
    pub fn repeat_with(&self, options: RepeatOptions) -> TickerFuture {
        self.assert_not_disposed("repeat");
        let min = options.min.unwrap_or(self.shared.lower_bound);
        let max = options.max.unwrap_or(self.shared.upper_bound);
        let period = options.period.or_else(|| self.duration());
        let Some(period) = period else {
            panic!(
                "AnimationController.repeat() called without an explicit period and with no \
                 default duration.\n\
                 Either the period argument should be provided, or the duration should be set \
                 before calling repeat()."
            );
        };
        assert!(
            max >= min,
            "AnimationController.repeat() requires min ({min}) <= max ({max})"
        );
        assert!(
            max <= self.shared.upper_bound && min >= self.shared.lower_bound,
            "AnimationController.repeat() range {min}..={max} must lie within the bounds {}..={}",
            self.shared.lower_bound,
            self.shared.upper_bound
        );

        let resolution = self.stop_deferred(true);
        tracing::debug!(
            label = ?self.shared.debug_label,
            min,
            max,
            reverse = options.reverse,
            ?period,
            "repeating"
        );
        let simulation = RepeatingSimulation::new(self.value(), min, max, options.reverse, period);
        let future = self.start_simulation(Box::new(simulation));
        resolution.dispatch();
        future
    }

    /// Settle at a bound with the default critically damped spring
    pub fn fling(&self, velocity: f64) -> TickerFuture {
        self.fling_with(velocity, FlingOptions::default())
    }

    /// Settle at the upper bound (`velocity >= 0`) or the lower bound with a
    /// spring, starting at `velocity` units per second
    ///
    /// The spring aims slightly past the bound so it comes to rest exactly on
    /// it once clamped.
    ///
    /// # Panics
    ///
    /// Panics if the spring is under-damped, the bound being flung towards
    /// is infinite, or the controller is disposed.
    pub fn fling_with(&self, velocity: f64, options: FlingOptions) -> TickerFuture {
        self.assert_not_disposed("fling");
        let spring = options.spring.unwrap_or_else(default_fling_spring);
        let tolerance = Tolerance::FLING;

        let direction = if velocity < 0.0 {
            AnimationDirection::Reverse
        } else {
            AnimationDirection::Forward
        };
        self.state_mut().direction = direction;
        let target = match direction {
            AnimationDirection::Reverse => self.shared.lower_bound - tolerance.distance,
            AnimationDirection::Forward => self.shared.upper_bound + tolerance.distance,
        };
        assert!(
            target.is_finite(),
            "AnimationController.fling() requires finite bounds.\n\
             A fling settles on the bound in the direction of the velocity, and \
             this controller's {} bound is infinite. Use animate_with() with a \
             SpringSimulation towards an explicit target instead.",
            match direction {
                AnimationDirection::Reverse => "lower",
                AnimationDirection::Forward => "upper",
            }
        );

        let behavior = options.behavior.unwrap_or(self.shared.behavior);
        let scale = match behavior {
            AnimationBehavior::Normal if self.reduced_motion() => REDUCED_MOTION_FLING_SCALE,
            AnimationBehavior::Normal | AnimationBehavior::Preserve => 1.0,
        };

        let simulation =
            SpringSimulation::new(spring, self.value(), target, velocity * scale, tolerance);
        assert!(
            simulation.spring_type() != SpringType::UnderDamped,
            "The specified spring simulation is of type SpringType::UnderDamped.\n\
             An under-damped spring results in oscillation rather than a fling. \
             Consider specifying a different spring, or use animate_with() with an \
             arbitrary SpringSimulation if an under-damped spring is intentional."
        );

        let resolution = self.stop_deferred(true);
        tracing::debug!(
            label = ?self.shared.debug_label,
            velocity,
            target,
            scale,
            "flinging"
        );
        let future = self.start_simulation(Box::new(simulation));
        resolution.dispatch();
        future
    }

    /// Drive the value with an arbitrary simulation, reporting a forward run
    pub fn animate_with(&self, simulation: impl Simulation + 'static) -> TickerFuture {
        self.assert_not_disposed("animate_with");
        self.state_mut().direction = AnimationDirection::Forward;
        self.run_simulation(Box::new(simulation))
    }

    /// Drive the value with an arbitrary simulation, reporting a reverse run
    pub fn animate_back_with_simulation(
        &self,
        simulation: impl Simulation + 'static,
    ) -> TickerFuture {
        self.assert_not_disposed("animate_back_with_simulation");
        self.state_mut().direction = AnimationDirection::Reverse;
        self.run_simulation(Box::new(simulation))
    }

    fn run_simulation(&self, simulation: Box<dyn Simulation>) -> TickerFuture {
        let resolution = self.stop_deferred(true);
        tracing::debug!(label = ?self.shared.debug_label, "animating with simulation");
        let future = self.start_simulation(simulation);
        resolution.dispatch();
        future
    }

    fn start_simulation(&self, simulation: Box<dyn Simulation>) -> TickerFuture {
        assert!(
            !self.is_animating(),
            "AnimationController started a simulation while already animating"
        );
        {
            let mut state = self.state_mut();
            state.value = simulation
                .x(0.0)
                .clamp(self.shared.lower_bound, self.shared.upper_bound);
            if let Some(direction) = simulation.direction_at(0.0) {
                state.direction = direction;
            }
            state.simulation = Some(simulation);
            state.last_elapsed = Some(Duration::ZERO);
        }
        let future = self.shared.ticker.borrow_mut().start();
        {
            let mut state = self.state_mut();
            state.status = state.direction.running_status();
        }
        self.check_status_changed();
        future
    }

    /// Stop the current run, canceling its future
    ///
    /// The value and status stay where they are.
    pub fn stop(&self) {
        self.stop_with(true);
    }

    /// Stop the current run; `canceled = false` completes its future instead
    ///
    /// # Panics
    ///
    /// Panics if the controller is disposed.
    pub fn stop_with(&self, canceled: bool) {
        self.assert_not_disposed("stop");
        self.stop_deferred(canceled).dispatch();
    }

    fn stop_deferred(&self, canceled: bool) -> Resolution {
        {
            let mut state = self.state_mut();
            state.simulation = None;
            state.last_elapsed = None;
        }
        self.shared.ticker.borrow_mut().stop_deferred(canceled)
    }

    /// Release the ticker and every listener
    ///
    /// A run in progress is canceled. The controller cannot be used for
    /// playback afterwards.
    ///
    /// # Panics
    ///
    /// Panics if the controller is already disposed.
    pub fn dispose(&self) {
        assert!(
            !self.is_disposed(),
            "AnimationController.dispose() called more than once.\n\
             A given AnimationController cannot be disposed more than once. ({})",
            self.debug_label().unwrap_or("unlabeled controller")
        );
        {
            let mut state = self.state_mut();
            state.disposed = true;
            state.simulation = None;
            state.last_elapsed = None;
        }
        let resolution = self.shared.ticker.borrow_mut().dispose_deferred();
        self.shared.listeners.clear_status_listeners();
        self.shared.listeners.clear_listeners();
        tracing::debug!(label = ?self.shared.debug_label, "animation controller disposed");
        resolution.dispatch();
    }

    /// Move the controller's ticker to `provider`
    ///
    /// A run in progress carries over with its elapsed time and muted state.
    pub fn resync(&self, provider: &dyn TickerProvider) {
        self.assert_not_disposed("resync");
        let mut ticker = provider.create_ticker(tick_callback(Rc::downgrade(&self.shared)));
        if let Some(label) = &self.shared.debug_label {
            ticker.set_debug_label(label.clone());
        }
        let mut current = self.shared.ticker.borrow_mut();
        ticker.absorb_ticker(&mut current);
        *current = ticker;
        tracing::debug!(label = ?self.shared.debug_label, "animation controller resynced");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn reduced_motion(&self) -> bool {
        self.shared.ticker.borrow().reduced_motion()
    }

    fn assert_not_disposed(&self, method: &str) {
        assert!(
            !self.is_disposed(),
            "AnimationController.{method}() called after AnimationController.dispose().\n\
             AnimationController methods should not be used after calling dispose()."
        );
    }

    /// Clamp and store `value`, deriving the status from it
    fn internal_set_value(&self, value: f64) {
        let mut state = self.state_mut();
        let (lower, upper) = (self.shared.lower_bound, self.shared.upper_bound);
        state.value = value.clamp(lower, upper);
        state.status = status_for(state.value, lower, upper, state.direction);
    }

    /// Tell status listeners about a net status change, if there is one
    fn check_status_changed(&self) {
        let changed = {
            let mut state = self.state_mut();
            if state.status == state.last_reported_status {
                None
            } else {
                state.last_reported_status = state.status;
                Some(state.status)
            }
        };
        if let Some(status) = changed {
            tracing::debug!(label = ?self.shared.debug_label, %status, "status changed");
            self.shared.listeners.notify_status_listeners(status);
        }
    }

    fn tick(&self, elapsed: Duration) {
        let time = seconds(elapsed);
        let finished = {
            let mut state = self.state_mut();
            let Some(simulation) = state.simulation.as_ref() else {
                return;
            };
            let value = simulation
                .x(time)
                .clamp(self.shared.lower_bound, self.shared.upper_bound);
            let sweep_direction = simulation.direction_at(time);
            // An interpolation is already exactly at its end on the frame
            // that reaches its duration
            let done =
                simulation.is_done(time) || simulation.duration().is_some_and(|end| time >= end);

            state.last_elapsed = Some(elapsed);
            state.value = value;
            if let Some(direction) = sweep_direction {
                state.direction = direction;
                state.status = direction.running_status();
            }
            if done {
                state.status = state.direction.terminal_status();
                state.simulation = None;
                state.last_elapsed = None;
            }
            tracing::trace!(label = ?self.shared.debug_label, ?elapsed, value, done, "tick");
            done
        };

        let resolution = if finished {
            self.shared.ticker.borrow_mut().stop_deferred(false)
        } else {
            Resolution::empty()
        };
        self.shared.listeners.notify_listeners();
        self.check_status_changed();
        resolution.dispatch();
    }
}

/// Elapsed time in seconds at microsecond resolution
fn seconds(elapsed: Duration) -> f64 {
    elapsed.as_micros() as f64 / 1_000_000.0
}

impl Animation<f64> for AnimationController {
    fn value(&self) -> f64 {
        AnimationController::value(self)
    }

    fn status(&self) -> AnimationStatus {
        AnimationController::status(self)
    }

    fn add_listener(&self, listener: Box<dyn Fn()>) -> ListenerId {
        self.shared.listeners.add_listener(Rc::from(listener))
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        AnimationController::remove_listener(self, id)
    }

    fn add_status_listener(&self, listener: Box<dyn Fn(AnimationStatus)>) -> StatusListenerId {
        self.shared.listeners.add_status_listener(Rc::from(listener))
    }

    fn remove_status_listener(&self, id: StatusListenerId) -> bool {
        AnimationController::remove_status_listener(self, id)
    }

    fn is_animating(&self) -> bool {
        AnimationController::is_animating(self)
    }
}

impl fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("AnimationController")
            .field("label", &self.shared.debug_label)
            .field("value", &state.value)
            .field("status", &state.status)
            .field("direction", &state.direction)
            .field("animating", &self.shared.ticker.borrow().is_active())
            .field("disposed", &state.disposed)
            .finish()
    }
}
