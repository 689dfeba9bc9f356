//! Error types shared by the core layer.

use thiserror::Error;

/// Errors raised while constructing or evaluating core components.
///
/// Shape and configuration problems fail fast at construction or at the
/// start of a forward pass; no partial results are ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Array dimensions do not line up.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    Shape {
        /// Where the mismatch was detected.
        context: &'static str,
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Invalid configuration value.
    #[error("invalid configuration '{name}': {reason}")]
    Config {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        reason: String,
    },
}
