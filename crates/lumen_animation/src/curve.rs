//! Easing curves
//!
//! A curve maps normalized progress `t` in `[0, 1]` to an eased progress.
//! [`Curve::transform`] enforces the domain and returns exactly `0.0` and
//! `1.0` at the endpoints, so implementations only have to describe the
//! interior through [`Curve::transform_internal`].
//!
//! # Built-in curves
//!
//! - [`Linear`]: identity
//! - [`Cubic`]: CSS-style cubic Bézier, with the usual presets
//!   ([`Cubic::EASE`], [`Cubic::EASE_IN_OUT`], ...)
//! - [`Decelerate`], [`Interval`], [`Threshold`], [`SawTooth`]
//! - [`FlippedCurve`]: a curve mirrored in both axes
//! - [`FnCurve`]: any closure

use std::fmt;
use std::rc::Rc;

/// Maximum error when solving a cubic Bézier for `x`
const CUBIC_ERROR_BOUND: f64 = 0.001;

/// A mapping from unit progress to eased progress
pub trait Curve {
    /// The curve's mapping for `0 < t < 1`
    fn transform_internal(&self, t: f64) -> f64;

    /// Map `t` through the curve
    ///
    /// # Panics
    ///
    /// Panics if `t` is outside `[0, 1]` (or NaN).
    fn transform(&self, t: f64) -> f64 {
        assert!(
            (0.0..=1.0).contains(&t),
            "parametric value {t} is outside of [0, 1] range"
        );
        if t == 0.0 || t == 1.0 {
            return t;
        }
        self.transform_internal(t)
    }

    /// This curve mirrored horizontally and vertically
    fn flipped(self) -> FlippedCurve<Self>
    where
        Self: Sized,
    {
        FlippedCurve::new(self)
    }
}

impl<C: Curve + ?Sized> Curve for Rc<C> {
    fn transform_internal(&self, t: f64) -> f64 {
        (**self).transform_internal(t)
    }
}

impl<C: Curve + ?Sized> Curve for Box<C> {
    fn transform_internal(&self, t: f64) -> f64 {
        (**self).transform_internal(t)
    }
}

/// The identity curve
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Linear;

impl Curve for Linear {
    fn transform_internal(&self, t: f64) -> f64 {
        t
    }
}

/// A cubic Bézier from `(0, 0)` to `(1, 1)` with control points `(a, b)` and
/// `(c, d)`, like CSS `cubic-bezier()`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cubic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Cubic {
    /// Slow start, fast middle, slow end
    pub const EASE: Cubic = Cubic::new(0.25, 0.1, 0.25, 1.0);
    pub const EASE_IN: Cubic = Cubic::new(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: Cubic = Cubic::new(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: Cubic = Cubic::new(0.42, 0.0, 0.58, 1.0);
    /// Material standard curve
    pub const FAST_OUT_SLOW_IN: Cubic = Cubic::new(0.4, 0.0, 0.2, 1.0);
    pub const LINEAR_TO_EASE_OUT: Cubic = Cubic::new(0.35, 0.91, 0.33, 0.97);

    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// One coordinate of the Bézier at parameter `m`
    fn evaluate(p1: f64, p2: f64, m: f64) -> f64 {
        let inv = 1.0 - m;
        3.0 * p1 * inv * inv * m + 3.0 * p2 * inv * m * m + m * m * m
    }
}

impl Curve for Cubic {
    fn transform_internal(&self, t: f64) -> f64 {
        // x(m) is monotonic for control points inside the unit square, so
        // bisection on m converges to the requested x
        let mut start = 0.0_f64;
        let mut end = 1.0_f64;
        loop {
            let midpoint = (start + end) / 2.0;
            let estimate = Self::evaluate(self.a, self.c, midpoint);
            if (t - estimate).abs() < CUBIC_ERROR_BOUND || (end - start) < f64::EPSILON {
                return Self::evaluate(self.b, self.d, midpoint);
            }
            if estimate < t {
                start = midpoint;
            } else {
                end = midpoint;
            }
        }
    }
}

/// Fast start that decelerates to rest, `1 - (1 - t)²`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Decelerate;

impl Curve for Decelerate {
    fn transform_internal(&self, t: f64) -> f64 {
        let inv = 1.0 - t;
        1.0 - inv * inv
    }
}

/// Runs `curve` inside `[begin, end]`; 0 before, 1 after
#[derive(Clone, Debug)]
pub struct Interval<C = Linear> {
    begin: f64,
    end: f64,
    curve: C,
}

impl Interval<Linear> {
    pub fn new(begin: f64, end: f64) -> Self {
        Self::with_curve(begin, end, Linear)
    }
}

impl<C: Curve> Interval<C> {
    /// # Panics
    ///
    /// Panics unless `0 <= begin <= end <= 1`.
    pub fn with_curve(begin: f64, end: f64, curve: C) -> Self {
        assert!(
            (0.0..=1.0).contains(&begin) && (0.0..=1.0).contains(&end) && begin <= end,
            "Interval requires 0 <= begin <= end <= 1 (got {begin}..{end})"
        );
        Self { begin, end, curve }
    }
}

impl<C: Curve> Curve for Interval<C> {
    fn transform_internal(&self, t: f64) -> f64 {
        if self.end == self.begin {
            return if t < self.begin { 0.0 } else { 1.0 };
        }
        let local = ((t - self.begin) / (self.end - self.begin)).clamp(0.0, 1.0);
        self.curve.transform(local)
    }
}

/// Jumps from 0 to 1 once `t` reaches `threshold`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    threshold: f64,
}

impl Threshold {
    pub fn new(threshold: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "Threshold must be within [0, 1] (got {threshold})"
        );
        Self { threshold }
    }
}

impl Curve for Threshold {
    fn transform_internal(&self, t: f64) -> f64 {
        if t < self.threshold {
            0.0
        } else {
            1.0
        }
    }
}

/// Repeats a linear ramp `count` times
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SawTooth {
    count: u32,
}

impl SawTooth {
    pub fn new(count: u32) -> Self {
        assert!(count > 0, "SawTooth needs at least one tooth");
        Self { count }
    }
}

impl Curve for SawTooth {
    fn transform_internal(&self, t: f64) -> f64 {
        let scaled = t * f64::from(self.count);
        scaled - scaled.trunc()
    }
}

/// `1 - curve(1 - t)`
#[derive(Clone, Debug)]
pub struct FlippedCurve<C> {
    curve: C,
}

impl<C: Curve> FlippedCurve<C> {
    pub fn new(curve: C) -> Self {
        Self { curve }
    }
}

impl<C: Curve> Curve for FlippedCurve<C> {
    fn transform_internal(&self, t: f64) -> f64 {
        1.0 - self.curve.transform(1.0 - t)
    }
}

/// A curve backed by a closure
///
/// The closure only sees the interior of the unit interval; endpoints are
/// handled by [`Curve::transform`].
pub struct FnCurve<F> {
    f: F,
}

impl<F: Fn(f64) -> f64> FnCurve<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: Fn(f64) -> f64> Curve for FnCurve<F> {
    fn transform_internal(&self, t: f64) -> f64 {
        (self.f)(t)
    }
}

impl<F> fmt::Debug for FnCurve<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCurve").finish_non_exhaustive()
    }
}
