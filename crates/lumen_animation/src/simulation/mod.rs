//! Simulations
//!
//! A simulation is a pure function of elapsed time: position `x(t)`, velocity
//! `dx(t)` and a termination predicate `is_done(t)`, all evaluated in seconds
//! since the simulation started. Nothing advances implicitly, so the same time
//! can be queried any number of times with the same result.
//!
//! - [`InterpolationSimulation`]: curve-driven tween over a fixed duration
//! - [`RepeatingSimulation`]: endless sweep between two values
//! - [`SpringSimulation`]: closed-form damped harmonic oscillator

mod interpolation;
mod repeating;
mod spring;

pub use interpolation::InterpolationSimulation;
pub use repeating::RepeatingSimulation;
pub use spring::{SpringDescription, SpringSimulation, SpringType};

use crate::status::AnimationDirection;

/// Thresholds for deciding that a simulation has converged
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    /// Largest distance from the rest position considered "at rest"
    pub distance: f64,
    /// Time step for finite differences, in seconds
    pub time: f64,
    /// Largest speed considered "at rest"
    pub velocity: f64,
}

impl Tolerance {
    pub const DEFAULT: Tolerance = Tolerance {
        distance: 1e-3,
        time: 1e-3,
        velocity: 1e-3,
    };

    /// Tolerance for flings: position decides, any residual speed is accepted
    pub const FLING: Tolerance = Tolerance {
        distance: 0.01,
        time: 1e-3,
        velocity: f64::INFINITY,
    };

    pub const fn new(distance: f64, time: f64, velocity: f64) -> Self {
        Self {
            distance,
            time,
            velocity,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Whether `value` is within `epsilon` of zero
pub(crate) fn near_zero(value: f64, epsilon: f64) -> bool {
    value == 0.0 || value.abs() < epsilon
}

/// Position and velocity as functions of elapsed seconds
pub trait Simulation {
    /// Position at `time`
    fn x(&self, time: f64) -> f64;

    /// Velocity at `time`
    fn dx(&self, time: f64) -> f64;

    /// Whether the simulation has come to rest at `time`
    fn is_done(&self, time: f64) -> bool;

    fn tolerance(&self) -> Tolerance {
        Tolerance::DEFAULT
    }

    /// Total running time in seconds, for simulations with a fixed one
    ///
    /// A driver may finish such a simulation on the frame that reaches this
    /// time, since `x` already returns the final position there.
    fn duration(&self) -> Option<f64> {
        None
    }

    /// Playback direction at `time`, for simulations that sweep back and forth
    fn direction_at(&self, _time: f64) -> Option<AnimationDirection> {
        None
    }
}

impl<S: Simulation + ?Sized> Simulation for Box<S> {
    fn x(&self, time: f64) -> f64 {
        (**self).x(time)
    }

    fn dx(&self, time: f64) -> f64 {
        (**self).dx(time)
    }

    fn is_done(&self, time: f64) -> bool {
        (**self).is_done(time)
    }

    fn tolerance(&self) -> Tolerance {
        (**self).tolerance()
    }

    fn duration(&self) -> Option<f64> {
        (**self).duration()
    }

    fn direction_at(&self, time: f64) -> Option<AnimationDirection> {
        (**self).direction_at(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tolerance() {
        let tolerance = Tolerance::default();
        assert_eq!(tolerance.distance, 1e-3);
        assert_eq!(tolerance.time, 1e-3);
        assert_eq!(tolerance.velocity, 1e-3);
    }

    #[test]
    fn test_near_zero() {
        assert!(near_zero(0.0, 0.0));
        assert!(near_zero(5e-4, 1e-3));
        assert!(!near_zero(-2e-3, 1e-3));
        assert!(near_zero(1e9, f64::INFINITY));
    }
}
