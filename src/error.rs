//! Error types for configuration

use thiserror::Error;

/// Errors produced when building or changing a configuration.
///
/// Values are rendered with `Debug` so one error type covers every numeric
/// parameter type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `current` outside `[minimum, maximum]`
    #[error("value {current} is outside [{minimum}, {maximum}]")]
    OutOfRange {
        minimum: String,
        maximum: String,
        current: String,
    },

    /// `minimum > maximum`
    #[error("range minimum {minimum} is greater than maximum {maximum}")]
    InvertedRange { minimum: String, maximum: String },

    /// Quantization step that is zero, negative or not finite
    #[error("invalid step {0}")]
    InvalidStep(String),

    #[error("number of regions must be at least 1 (minimum was {0})")]
    TooFewRegions(u32),

    #[error("number of regions cannot exceed {limit} (maximum was {maximum})")]
    TooManyRegions { maximum: u32, limit: u32 },

    #[error("number of items per region must be at least 1 (minimum was {0})")]
    TooFewItems(u32),

    #[error("item elasticity cannot be negative (minimum was {0})")]
    NegativeElasticity(f32),

    #[error("item size must be positive (minimum was {0})")]
    NonPositiveSize(f32),

    #[error("update interval must be greater than zero")]
    ZeroUpdateInterval,

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
