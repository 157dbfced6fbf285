//! Motion tokens
//!
//! Named controller and spring presets loaded from TOML, so durations and
//! spring constants can be tuned without touching code.
//!
//! ```toml
//! [controllers.drawer]
//! duration_ms = 250
//! reverse_duration_ms = 200
//! behavior = "normal"
//!
//! [springs.snappy]
//! mass = 1.0
//! stiffness = 600.0
//! damping_ratio = 1.2
//! ```

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::simulation::SpringDescription;
use crate::status::AnimationBehavior;

/// Construction parameters for an [`AnimationController`](crate::AnimationController)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub duration_ms: Option<u64>,
    pub reverse_duration_ms: Option<u64>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Starting value, the lower bound when absent
    pub initial_value: Option<f64>,
    pub behavior: AnimationBehavior,
    pub debug_label: Option<String>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: None,
            reverse_duration_ms: None,
            lower_bound: 0.0,
            upper_bound: 1.0,
            initial_value: None,
            behavior: AnimationBehavior::Normal,
            debug_label: None,
        }
    }
}

impl AnimationConfig {
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    pub fn reverse_duration(&self) -> Option<Duration> {
        self.reverse_duration_ms.map(Duration::from_millis)
    }

    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidBounds {
            name: name.to_string(),
            reason,
        };
        if self.lower_bound.is_nan() || self.upper_bound.is_nan() {
            return Err(invalid("bounds must not be NaN".to_string()));
        }
        if self.lower_bound > self.upper_bound {
            return Err(invalid(format!(
                "lower_bound {} exceeds upper_bound {}",
                self.lower_bound, self.upper_bound
            )));
        }
        if let Some(value) = self.initial_value {
            if !(self.lower_bound..=self.upper_bound).contains(&value) {
                return Err(invalid(format!(
                    "initial_value {value} is outside {}..={}",
                    self.lower_bound, self.upper_bound
                )));
            }
        }
        Ok(())
    }
}

/// A spring given either by its damping or by a ratio of critical damping
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpringToken {
    #[serde(default = "default_mass")]
    pub mass: f64,
    pub stiffness: f64,
    pub damping: Option<f64>,
    pub damping_ratio: Option<f64>,
}

fn default_mass() -> f64 {
    1.0
}

impl SpringToken {
    fn resolve(&self, name: &str) -> Result<SpringDescription> {
        let invalid = |reason: &str| ConfigError::InvalidSpring {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(invalid("mass must be positive and finite"));
        }
        if !(self.stiffness > 0.0 && self.stiffness.is_finite()) {
            return Err(invalid("stiffness must be positive and finite"));
        }
        let spring = match (self.damping, self.damping_ratio) {
            (Some(damping), None) => SpringDescription::new(self.mass, self.stiffness, damping),
            (None, Some(ratio)) => {
                SpringDescription::with_damping_ratio(self.mass, self.stiffness, ratio)
            }
            (Some(_), Some(_)) => {
                return Err(invalid("set either damping or damping_ratio, not both"))
            }
            (None, None) => return Err(invalid("one of damping or damping_ratio is required")),
        };
        if !(spring.damping >= 0.0 && spring.damping.is_finite()) {
            return Err(invalid("damping must be non-negative and finite"));
        }
        Ok(spring)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TokenFile {
    controllers: FxHashMap<String, AnimationConfig>,
    springs: FxHashMap<String, SpringToken>,
}

/// A validated set of named controller and spring presets
#[derive(Clone, Debug, Default)]
pub struct MotionTokens {
    controllers: FxHashMap<String, AnimationConfig>,
    springs: FxHashMap<String, SpringDescription>,
}

impl MotionTokens {
    /// Parse and validate a token document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: TokenFile = toml::from_str(source)?;

        for (name, config) in &file.controllers {
            config.validate(name)?;
        }
        let springs = file
            .springs
            .iter()
            .map(|(name, token)| Ok((name.clone(), token.resolve(name)?)))
            .collect::<Result<FxHashMap<_, _>>>()?;

        tracing::debug!(
            controllers = file.controllers.len(),
            springs = springs.len(),
            "loaded motion tokens"
        );
        Ok(Self {
            controllers: file.controllers,
            springs,
        })
    }

    pub fn controller(&self, name: &str) -> Option<&AnimationConfig> {
        self.controllers.get(name)
    }

    pub fn spring(&self, name: &str) -> Option<SpringDescription> {
        self.springs.get(name).copied()
    }

    /// Controller token names, sorted
    pub fn controller_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.controllers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Spring token names, sorted
    pub fn spring_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.springs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
