//! Animation lifecycle status
//!
//! Every driven animation reports one of four coarse phases. The phase is
//! distinct from the continuous value: a controller sitting at its lower bound
//! is `Dismissed`, one sitting at its upper bound is `Completed`, and one in
//! flight is `Forward` or `Reverse` depending on its playback direction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The coarse lifecycle phase of an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationStatus {
    /// Stopped at the beginning
    Dismissed,
    /// Running from the beginning towards the end
    Forward,
    /// Running from the end towards the beginning
    Reverse,
    /// Stopped at the end
    Completed,
}

impl AnimationStatus {
    #[inline]
    pub fn is_dismissed(self) -> bool {
        self == AnimationStatus::Dismissed
    }

    #[inline]
    pub fn is_completed(self) -> bool {
        self == AnimationStatus::Completed
    }

    /// True while running in either direction
    #[inline]
    pub fn is_animating(self) -> bool {
        matches!(self, AnimationStatus::Forward | AnimationStatus::Reverse)
    }

    /// True when running forward or resting at the end (used by toggle)
    #[inline]
    pub fn is_forward_or_completed(self) -> bool {
        matches!(self, AnimationStatus::Forward | AnimationStatus::Completed)
    }

    /// The status an inverted animation reports
    pub fn flipped(self) -> Self {
        match self {
            AnimationStatus::Dismissed => AnimationStatus::Completed,
            AnimationStatus::Forward => AnimationStatus::Reverse,
            AnimationStatus::Reverse => AnimationStatus::Forward,
            AnimationStatus::Completed => AnimationStatus::Dismissed,
        }
    }
}

impl fmt::Display for AnimationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnimationStatus::Dismissed => "dismissed",
            AnimationStatus::Forward => "forward",
            AnimationStatus::Reverse => "reverse",
            AnimationStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Playback direction of a controller
///
/// Persists across playback calls; the status is derived from it whenever the
/// value is strictly between the bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AnimationDirection {
    #[default]
    Forward,
    Reverse,
}

impl AnimationDirection {
    /// Status reported while running in this direction
    pub fn running_status(self) -> AnimationStatus {
        match self {
            AnimationDirection::Forward => AnimationStatus::Forward,
            AnimationDirection::Reverse => AnimationStatus::Reverse,
        }
    }

    /// Status reported once a run in this direction has finished
    pub fn terminal_status(self) -> AnimationStatus {
        match self {
            AnimationDirection::Forward => AnimationStatus::Completed,
            AnimationDirection::Reverse => AnimationStatus::Dismissed,
        }
    }
}

/// How a controller reacts when the platform asks for reduced motion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationBehavior {
    /// Shorten durations (and speed up flings) under reduced motion
    #[default]
    Normal,
    /// Ignore reduced motion; for animations that carry meaning, like a
    /// progress indicator
    Preserve,
}
