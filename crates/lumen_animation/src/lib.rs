//! Lumen Animation System
//!
//! Frame-driven animation controllers, easing curves and physics simulations.
//!
//! # Features
//!
//! - **AnimationController**: Drives a value between bounds with forward,
//!   reverse, toggle, animate-to, repeat and fling playback
//! - **Simulations**: Pure functions of time for interpolation, repeating
//!   sweeps and closed-form damped springs
//! - **Curves**: Cubic Bézier presets, intervals, thresholds and flipped curves
//! - **Tickers**: Per-frame callbacks with one-shot completion futures
//! - **AnimationScheduler**: A deterministic frame clock that provides tickers
//! - **Composition**: Derived, curved and reversed animations plus tweens
//! - **Motion Tokens**: Named controller and spring presets loaded from TOML
//!
//! # Quick Start
//!
//! ```rust
//! use lumen_animation::{Animatable, Animation, AnimationController, AnimationScheduler, Tween};
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! let scheduler = AnimationScheduler::new();
//! let controller = AnimationController::builder()
//!     .duration(Duration::from_millis(200))
//!     .build(&scheduler);
//! let opacity = Tween::new(0.0_f32, 1.0).animate(Rc::new(controller.clone()));
//!
//! controller.forward(None);
//! scheduler.advance(Duration::from_millis(100));
//! assert!((opacity.value() - 0.5).abs() < 1e-6);
//! ```

pub mod animation;
pub mod config;
pub mod controller;
pub mod curve;
pub mod error;
pub mod scheduler;
pub mod simulation;
pub mod status;
pub mod ticker;
pub mod values;


pub use animation::{
    Animation, AnimationListeners, CurvedAnimation, DerivedAnimation, ReverseAnimation,
};
pub use config::{AnimationConfig, MotionTokens, SpringToken};
pub use controller::{
    AnimateOptions, AnimationController, AnimationControllerBuilder, FlingOptions,
    RepeatOptions, WeakAnimationController,
};
pub use curve::{
    Cubic, Curve, Decelerate, FlippedCurve, FnCurve, Interval, Linear, SawTooth, Threshold,
};
pub use error::{ConfigError, TickerCanceled};
pub use scheduler::{AnimationScheduler, SchedulerHandle, TickerId};
pub use simulation::{
    InterpolationSimulation, RepeatingSimulation, Simulation, SpringDescription,
    SpringSimulation, SpringType, Tolerance,
};
pub use status::{AnimationBehavior, AnimationDirection, AnimationStatus};
pub use ticker::{Ticker, TickerFuture, TickerFutureOrCancel, TickerProvider};
pub use values::{Animatable, Chained, CurveTween, Interpolate, Tween};

pub use lumen_core::listenable::{ListenerId, StatusListenerId};
