//! Spring physics
//!
//! Closed-form damped harmonic oscillator. Unlike a stepped integrator, the
//! position at any time is computed directly from the initial conditions, so
//! frames can arrive at any rate without accumulating error.

use serde::{Deserialize, Serialize};

use super::{near_zero, Simulation, Tolerance};

/// Physical parameters of a spring
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringDescription {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl SpringDescription {
    pub const fn new(mass: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            mass,
            stiffness,
            damping,
        }
    }

    /// Derive damping from a ratio of critical damping
    ///
    /// A ratio of 1 is critically damped, below 1 oscillates, above 1 creeps.
    pub fn with_damping_ratio(mass: f64, stiffness: f64, ratio: f64) -> Self {
        Self {
            mass,
            stiffness,
            damping: ratio * 2.0 * (mass * stiffness).sqrt(),
        }
    }

    /// A gentle, slow spring (good for page transitions)
    pub const fn gentle() -> Self {
        Self::new(1.0, 120.0, 14.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub const fn wobbly() -> Self {
        Self::new(1.0, 180.0, 12.0)
    }

    /// A stiff, snappy spring (good for buttons)
    pub const fn stiff() -> Self {
        Self::new(1.0, 400.0, 30.0)
    }

    /// A very stiff spring with minimal oscillation
    pub const fn snappy() -> Self {
        Self::new(1.0, 600.0, 40.0)
    }

    /// A slow spring with no overshoot (critically damped)
    pub const fn molasses() -> Self {
        Self::new(1.0, 100.0, 20.0)
    }

    /// Damping at which this spring stops oscillating
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping / self.critical_damping()
    }

    pub fn spring_type(&self) -> SpringType {
        let four_mk = 4.0 * self.mass * self.stiffness;
        let cmk = self.damping * self.damping - four_mk;
        // Relative check: with_damping_ratio(.., 1.0) rarely squares back exactly
        if cmk.abs() <= 1e-9 * four_mk {
            SpringType::CriticallyDamped
        } else if cmk > 0.0 {
            SpringType::OverDamped
        } else {
            SpringType::UnderDamped
        }
    }
}

impl Default for SpringDescription {
    fn default() -> Self {
        Self::stiff()
    }
}

/// Damping regime of a spring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpringType {
    /// Returns to rest as fast as possible without oscillating
    CriticallyDamped,
    /// Oscillates around the rest position while decaying
    UnderDamped,
    /// Creeps towards the rest position without oscillating
    OverDamped,
}

/// Displacement from the rest position as a function of time
#[derive(Clone, Copy, Debug)]
enum Solution {
    Critical { r: f64, c1: f64, c2: f64 },
    Over { r1: f64, r2: f64, c1: f64, c2: f64 },
    Under { w: f64, r: f64, c1: f64, c2: f64 },
}

impl Solution {
    fn new(spring: &SpringDescription, distance: f64, velocity: f64) -> Self {
        let SpringDescription {
            mass,
            stiffness,
            damping,
        } = *spring;
        match spring.spring_type() {
            SpringType::CriticallyDamped => {
                let r = -damping / (2.0 * mass);
                Solution::Critical {
                    r,
                    c1: distance,
                    c2: velocity - r * distance,
                }
            }
            SpringType::OverDamped => {
                let root = (damping * damping - 4.0 * mass * stiffness).sqrt();
                let r1 = (-damping - root) / (2.0 * mass);
                let r2 = (-damping + root) / (2.0 * mass);
                let c2 = (velocity - r1 * distance) / (r2 - r1);
                Solution::Over {
                    r1,
                    r2,
                    c1: distance - c2,
                    c2,
                }
            }
            SpringType::UnderDamped => {
                let w = (4.0 * mass * stiffness - damping * damping).sqrt() / (2.0 * mass);
                let r = -(damping / (2.0 * mass));
                Solution::Under {
                    w,
                    r,
                    c1: distance,
                    c2: (velocity - r * distance) / w,
                }
            }
        }
    }

    fn x(&self, t: f64) -> f64 {
        match *self {
            Solution::Critical { r, c1, c2 } => (c1 + c2 * t) * (r * t).exp(),
            Solution::Over { r1, r2, c1, c2 } => c1 * (r1 * t).exp() + c2 * (r2 * t).exp(),
            Solution::Under { w, r, c1, c2 } => {
                (r * t).exp() * (c1 * (w * t).cos() + c2 * (w * t).sin())
            }
        }
    }

    fn dx(&self, t: f64) -> f64 {
        match *self {
            Solution::Critical { r, c1, c2 } => {
                let power = (r * t).exp();
                r * (c1 + c2 * t) * power + c2 * power
            }
            Solution::Over { r1, r2, c1, c2 } => {
                c1 * r1 * (r1 * t).exp() + c2 * r2 * (r2 * t).exp()
            }
            Solution::Under { w, r, c1, c2 } => {
                let power = (r * t).exp();
                let (sin, cos) = (w * t).sin_cos();
                power * (c2 * w * cos - c1 * w * sin) + r * power * (c2 * sin + c1 * cos)
            }
        }
    }
}

/// A spring pulling a particle from `start` towards `end`
#[derive(Clone, Debug)]
pub struct SpringSimulation {
    spring: SpringDescription,
    end: f64,
    solution: Solution,
    tolerance: Tolerance,
    snap_to_end: bool,
}

impl SpringSimulation {
    pub fn new(
        spring: SpringDescription,
        start: f64,
        end: f64,
        velocity: f64,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            spring,
            end,
            solution: Solution::new(&spring, start - end, velocity),
            tolerance,
            snap_to_end: false,
        }
    }

    /// Report exactly `end` (and zero velocity) once the spring is done
    pub fn snap_to_end(mut self, snap: bool) -> Self {
        self.snap_to_end = snap;
        self
    }

    pub fn spring(&self) -> &SpringDescription {
        &self.spring
    }

    pub fn spring_type(&self) -> SpringType {
        self.spring.spring_type()
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

impl Simulation for SpringSimulation {
    fn x(&self, time: f64) -> f64 {
        if self.snap_to_end && self.is_done(time) {
            self.end
        } else {
            self.end + self.solution.x(time)
        }
    }

    fn dx(&self, time: f64) -> f64 {
        if self.snap_to_end && self.is_done(time) {
            0.0
        } else {
            self.solution.dx(time)
        }
    }

    fn is_done(&self, time: f64) -> bool {
        near_zero(self.solution.x(time), self.tolerance.distance)
            && near_zero(self.solution.dx(time), self.tolerance.velocity)
    }

    fn tolerance(&self) -> Tolerance {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_types() {
        assert_eq!(SpringDescription::wobbly().spring_type(), SpringType::UnderDamped);
        assert_eq!(
            SpringDescription::molasses().spring_type(),
            SpringType::CriticallyDamped
        );
        assert_eq!(
            SpringDescription::new(1.0, 100.0, 40.0).spring_type(),
            SpringType::OverDamped
        );
        assert_eq!(
            SpringDescription::with_damping_ratio(1.0, 500.0, 1.0).spring_type(),
            SpringType::CriticallyDamped
        );
    }

    #[test]
    fn test_critical_damping() {
        let spring = SpringDescription::new(1.0, 100.0, 5.0);
        assert!((spring.critical_damping() - 20.0).abs() < 1e-12);
        assert!((spring.damping_ratio() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_initial_conditions_hold_for_every_regime() {
        for spring in [
            SpringDescription::wobbly(),
            SpringDescription::molasses(),
            SpringDescription::new(1.0, 100.0, 40.0),
        ] {
            let sim = SpringSimulation::new(spring, 0.25, 1.0, 3.0, Tolerance::DEFAULT);
            assert!((sim.x(0.0) - 0.25).abs() < 1e-12, "{spring:?}");
            assert!((sim.dx(0.0) - 3.0).abs() < 1e-9, "{spring:?}");
        }
    }

    #[test]
    fn test_settles_at_end() {
        let sim = SpringSimulation::new(
            SpringDescription::stiff(),
            0.0,
            1.0,
            0.0,
            Tolerance::DEFAULT,
        );
        assert!(!sim.is_done(0.0));
        assert!(sim.is_done(5.0));
        assert!((sim.x(5.0) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_underdamped_overshoots() {
        let sim = SpringSimulation::new(
            SpringDescription::wobbly(),
            0.0,
            1.0,
            0.0,
            Tolerance::DEFAULT,
        );
        let peak = (1..200)
            .map(|i| sim.x(f64::from(i) * 0.005))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_velocity_matches_finite_difference() {
        let sim = SpringSimulation::new(
            SpringDescription::new(1.0, 100.0, 40.0),
            0.0,
            1.0,
            -2.0,
            Tolerance::DEFAULT,
        );
        let t = 0.2;
        let h = 1e-6;
        let numeric = (sim.x(t + h) - sim.x(t - h)) / (2.0 * h);
        assert!((numeric - sim.dx(t)).abs() < 1e-5);
    }

    #[test]
    fn test_snap_to_end() {
        let sim = SpringSimulation::new(
            SpringDescription::molasses(),
            0.0,
            1.0,
            0.0,
            Tolerance::DEFAULT,
        )
        .snap_to_end(true);
        assert_eq!(sim.x(10.0), 1.0);
        assert_eq!(sim.dx(10.0), 0.0);
    }
}
