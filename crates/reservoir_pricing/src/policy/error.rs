//! Error types for policy loading and execution.

use reservoir_core::CoreError;
use reservoir_models::ModelError;
use thiserror::Error;

use crate::payoffs::PayoffError;

/// Errors raised while loading a policy artifact or running the engine.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// The artifact carries no per-date coefficients at all.
    #[error("no learned policy available: coefficient map is empty")]
    MissingPolicy,

    /// A coefficient vector does not match the reservoir output width.
    #[error("coefficients for date {date} have length {actual}, expected {expected} (hidden size + 1)")]
    CoefficientDimension {
        /// Exercise date of the offending vector.
        date: usize,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A shape disagreement between artifact, model and path batch.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    Shape {
        /// What was being checked.
        context: &'static str,
        /// Expected value.
        expected: usize,
        /// Actual value.
        actual: usize,
    },

    /// Artifact serialization failure.
    #[error("artifact serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid payoff inside the artifact.
    #[error(transparent)]
    Payoff(#[from] PayoffError),

    /// Invalid model parameters inside the artifact.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Reservoir evaluation failure.
    #[error(transparent)]
    Core(#[from] CoreError),
}
