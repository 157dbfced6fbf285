use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use super::{Simulation, Tolerance};
use crate::curve::Curve;

/// Moves from `begin` to `end` along a curve over a fixed duration
///
/// `x` returns `begin` exactly at time zero and `end` exactly once the
/// duration has elapsed, whatever the curve evaluates to near the ends.
#[derive(Clone)]
pub struct InterpolationSimulation {
    begin: f64,
    end: f64,
    duration_secs: f64,
    curve: Rc<dyn Curve>,
}

impl InterpolationSimulation {
    /// `scale` stretches (or shrinks) `duration`
    ///
    /// # Panics
    ///
    /// Panics if the scaled duration is not positive.
    pub fn new(begin: f64, end: f64, duration: Duration, curve: Rc<dyn Curve>, scale: f64) -> Self {
        let duration_secs = duration.as_micros() as f64 * scale / 1_000_000.0;
        assert!(
            duration_secs > 0.0,
            "InterpolationSimulation requires a positive duration (got {duration_secs}s)"
        );
        Self {
            begin,
            end,
            duration_secs,
            curve,
        }
    }

    pub fn begin(&self) -> f64 {
        self.begin
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}

impl Simulation for InterpolationSimulation {
    fn x(&self, time: f64) -> f64 {
        let t = (time / self.duration_secs).clamp(0.0, 1.0);
        if t == 0.0 {
            self.begin
        } else if t == 1.0 {
            self.end
        } else {
            self.begin + (self.end - self.begin) * self.curve.transform(t)
        }
    }

    fn dx(&self, time: f64) -> f64 {
        let epsilon = self.tolerance().time;
        (self.x(time + epsilon) - self.x(time - epsilon)) / (2.0 * epsilon)
    }

    fn is_done(&self, time: f64) -> bool {
        time > self.duration_secs
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance::DEFAULT
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration_secs)
    }
}

impl fmt::Debug for InterpolationSimulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpolationSimulation")
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("duration_secs", &self.duration_secs)
            .finish_non_exhaustive()
    }
}
