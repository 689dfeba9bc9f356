//! Error types for model configuration and path generation.

use thiserror::Error;

/// Maximum number of simulation paths allowed per call.
///
/// Memory grows with `nb_paths * nb_stocks * nb_dates`; the cap guards
/// against unbounded allocation from a single request.
pub const MAX_PATHS: usize = 10_000_000;

/// Errors raised while validating model parameters or generating paths.
///
/// All of these fail fast before any simulation work starts. Numeric
/// floor events (variance driven negative) are silent clamps, never
/// errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Hurst exponent outside the open interval (0, 0.5).
    #[error("invalid Hurst exponent {0}: rough volatility requires 0 < H < 0.5")]
    InvalidHurst(f64),

    /// Correlation outside [-1, 1].
    #[error("invalid correlation {0}: must lie in [-1, 1]")]
    InvalidCorrelation(f64),

    /// Path count outside [1, MAX_PATHS].
    #[error("invalid path count {0}: must be in range [1, {MAX_PATHS}]")]
    InvalidPathCount(usize),

    /// Any other invalid parameter value.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::InvalidHurst(0.7);
        assert!(err.to_string().contains("0.7"));

        let err = ModelError::InvalidParameter {
            name: "spot",
            reason: "must be positive".to_string(),
        };
        assert!(err.to_string().contains("spot"));
    }
}
