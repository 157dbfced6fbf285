//! Animation error types

use thiserror::Error;

/// Delivered through [`TickerFutureOrCancel`](crate::ticker::TickerFutureOrCancel)
/// when a run is stopped before it finishes on its own
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("The ticker was canceled before the animation completed")]
pub struct TickerCanceled;

/// Motion token loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid TOML or does not match the token schema
    #[error("Failed to parse motion tokens: {0}")]
    Parse(#[from] toml::de::Error),

    /// A controller token has unusable bounds or initial value
    #[error("Invalid bounds for controller '{name}': {reason}")]
    InvalidBounds { name: String, reason: String },

    /// A spring token is missing parameters or has non-physical ones
    #[error("Invalid spring '{name}': {reason}")]
    InvalidSpring { name: String, reason: String },
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;
