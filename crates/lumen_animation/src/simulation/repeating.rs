use std::time::Duration;

use super::Simulation;
use crate::status::AnimationDirection;

/// Sweeps between `min` and `max` forever, one sweep per `period`
///
/// With `reverse` set, odd sweeps run from `max` back to `min`. The starting
/// phase comes from where `initial_value` sits within the range, so
/// restarting a repeat from the current value does not jump.
#[derive(Clone, Debug)]
pub struct RepeatingSimulation {
    min: f64,
    max: f64,
    reverse: bool,
    period_secs: f64,
    initial_t: f64,
}

impl RepeatingSimulation {
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(initial_value: f64, min: f64, max: f64, reverse: bool, period: Duration) -> Self {
        let period_secs = period.as_micros() as f64 / 1_000_000.0;
        assert!(
            period_secs > 0.0,
            "RepeatingSimulation requires a positive period"
        );
        let initial_t = if max == min {
            0.0
        } else {
            ((initial_value.clamp(min, max) - min) / (max - min)) * period_secs
        };
        Self {
            min,
            max,
            reverse,
            period_secs,
            initial_t,
        }
    }

    pub fn period_secs(&self) -> f64 {
        self.period_secs
    }

    /// Index of the sweep that `time` falls into
    pub fn cycle_at(&self, time: f64) -> u64 {
        ((time + self.initial_t) / self.period_secs).floor().max(0.0) as u64
    }

    /// Whether the sweep at `time` runs from `max` to `min`
    fn is_reversed_at(&self, time: f64) -> bool {
        self.reverse && self.cycle_at(time) % 2 == 1
    }

    pub fn direction(&self, time: f64) -> AnimationDirection {
        if self.is_reversed_at(time) {
            AnimationDirection::Reverse
        } else {
            AnimationDirection::Forward
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

impl Simulation for RepeatingSimulation {
    fn x(&self, time: f64) -> f64 {
        let t = ((time + self.initial_t) / self.period_secs).rem_euclid(1.0);
        if self.is_reversed_at(time) {
            lerp(self.max, self.min, t)
        } else {
            lerp(self.min, self.max, t)
        }
    }

    fn dx(&self, time: f64) -> f64 {
        let speed = (self.max - self.min) / self.period_secs;
        if self.is_reversed_at(time) {
            -speed
        } else {
            speed
        }
    }

    fn is_done(&self, _time: f64) -> bool {
        false
    }

    fn direction_at(&self, time: f64) -> Option<AnimationDirection> {
        Some(self.direction(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_periodic_without_reverse() {
        let sim = RepeatingSimulation::new(0.0, 0.0, 1.0, false, Duration::from_millis(400));
        for i in 0..20 {
            let t = f64::from(i) * 0.037;
            assert!(close(sim.x(t), sim.x(t + 0.4)), "t = {t}");
        }
        assert_eq!(sim.direction(0.9), AnimationDirection::Forward);
        assert!(!sim.is_done(1e6));
    }

    #[test]
    fn test_reverse_alternates_each_period() {
        let sim = RepeatingSimulation::new(0.0, 0.0, 1.0, true, Duration::from_secs(1));

        assert!(close(sim.x(0.25), 0.25));
        assert_eq!(sim.direction(0.25), AnimationDirection::Forward);

        assert!(close(sim.x(1.25), 0.75));
        assert_eq!(sim.direction(1.25), AnimationDirection::Reverse);
        assert!(sim.dx(1.25) < 0.0);

        assert!(close(sim.x(2.25), 0.25));
        assert_eq!(sim.direction(2.25), AnimationDirection::Forward);
    }

    #[test]
    fn test_direction_flips_exactly_on_boundaries() {
        let sim = RepeatingSimulation::new(0.0, 0.0, 1.0, true, Duration::from_secs(1));
        assert_eq!(sim.direction(0.999_999), AnimationDirection::Forward);
        assert_eq!(sim.direction(1.0), AnimationDirection::Reverse);
        assert_eq!(sim.x(1.0), 1.0);
        assert_eq!(sim.direction(2.0), AnimationDirection::Forward);
        assert_eq!(sim.x(2.0), 0.0);

        let flips = (0..400)
            .map(|i| sim.direction(f64::from(i) * 0.01))
            .collect::<Vec<_>>()
            .windows(2)
            .filter(|pair| pair[0] != pair[1])
            .count();
        assert_eq!(flips, 3);
    }

    #[test]
    fn test_initial_value_sets_phase() {
        let sim = RepeatingSimulation::new(0.5, 0.0, 2.0, false, Duration::from_secs(2));
        assert!(close(sim.x(0.0), 0.5));
        assert!(close(sim.x(0.5), 1.0));
    }

    #[test]
    fn test_degenerate_range() {
        let sim = RepeatingSimulation::new(3.0, 1.0, 1.0, true, Duration::from_secs(1));
        assert!(close(sim.x(0.3), 1.0));
        assert_eq!(sim.dx(0.3), 0.0);
    }
}
