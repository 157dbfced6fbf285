//! Animatable value types
//!
//! Provides traits for values that can be animated and the tweens that map a
//! controller's unit progress onto them.
//!
//! ```rust
//! use lumen_animation::{Animatable, Cubic, CurveTween, Tween};
//!
//! let width = Tween::new(100.0_f32, 300.0).chain(CurveTween::new(Cubic::EASE_OUT));
//! assert_eq!(width.transform(0.0), 100.0);
//! assert_eq!(width.transform(1.0), 300.0);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::animation::{Animation, DerivedAnimation};
use crate::curve::Curve;

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t as f32
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        f64::from((self - other).abs()) < epsilon
    }
}

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() < epsilon
    }
}

/// A mapping from an animation's unit progress to a value of type `T`
pub trait Animatable<T>: 'static {
    fn transform(&self, t: f64) -> T;

    /// The value at `animation`'s current progress
    fn evaluate(&self, animation: &dyn Animation<f64>) -> T {
        self.transform(animation.value())
    }

    /// An animation of `T` driven by `parent`
    fn animate(self, parent: Rc<dyn Animation<f64>>) -> DerivedAnimation<T>
    where
        Self: Sized,
    {
        DerivedAnimation::new(parent, move |t| self.transform(t))
    }

    /// Feed `parent`'s output into this mapping
    fn chain<P: Animatable<f64>>(self, parent: P) -> Chained<P, Self>
    where
        Self: Sized,
    {
        Chained { parent, child: self }
    }
}

/// Interpolates from `begin` to `end`, returning them exactly at 0 and 1
#[derive(Clone, Debug, PartialEq)]
pub struct Tween<T> {
    pub begin: T,
    pub end: T,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(begin: T, end: T) -> Self {
        Self { begin, end }
    }

    pub fn lerp(&self, t: f64) -> T {
        self.begin.lerp(&self.end, t)
    }
}

impl<T: Interpolate + 'static> Animatable<T> for Tween<T> {
    fn transform(&self, t: f64) -> T {
        if t == 0.0 {
            return self.begin.clone();
        }
        if t == 1.0 {
            return self.end.clone();
        }
        self.lerp(t)
    }
}

/// Applies a curve to unit progress
#[derive(Clone)]
pub struct CurveTween {
    curve: Rc<dyn Curve>,
}

impl CurveTween {
    pub fn new(curve: impl Curve + 'static) -> Self {
        Self {
            curve: Rc::new(curve),
        }
    }
}

impl Animatable<f64> for CurveTween {
    fn transform(&self, t: f64) -> f64 {
        self.curve.transform(t)
    }
}

impl fmt::Debug for CurveTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveTween").finish_non_exhaustive()
    }
}

/// `child(parent(t))`, built by [`Animatable::chain`]
#[derive(Clone, Debug)]
pub struct Chained<P, C> {
    parent: P,
    child: C,
}

impl<T, P: Animatable<f64>, C: Animatable<T>> Animatable<T> for Chained<P, C> {
    fn transform(&self, t: f64) -> T {
        self.child.transform(self.parent.transform(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Cubic, Threshold};

    #[test]
    fn test_float_interpolation() {
        assert!((0.0_f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0_f64.lerp(&20.0, 0.25) - 12.5).abs() < 1e-12);
        assert!(1.0_f64.approx_eq(&1.0005, 1e-3));
        assert!(!1.0_f32.approx_eq(&1.1, 1e-3));
    }

    #[test]
    fn test_tween_exact_endpoints() {
        let tween = Tween::new(0.1_f64, 0.7);
        assert_eq!(tween.transform(0.0), 0.1);
        assert_eq!(tween.transform(1.0), 0.7);
        assert!((tween.transform(0.5) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_chain_applies_curve_first() {
        let stepped = Tween::new(0.0_f64, 10.0).chain(CurveTween::new(Threshold::new(0.5)));
        assert_eq!(stepped.transform(0.25), 0.0);
        assert_eq!(stepped.transform(0.75), 10.0);

        let eased = Tween::new(0.0_f64, 1.0).chain(CurveTween::new(Cubic::EASE_IN));
        assert_eq!(eased.transform(0.3), Cubic::EASE_IN.transform(0.3));
    }
}
