//! Exotic payoff library.
//!
//! Every payoff evaluates against a [`PathView`]: a window over the path
//! ensemble truncated at the exercise date under consideration. The
//! barrier rule is uniform across the registry: knock-out conditions use
//! the running extrema over *all* assets and *all* dates inside the
//! window, and a breach zeroes the payoff for that path permanently. The
//! payoff magnitude itself only ever reads the current cross-section
//! (plus the running maximum for lookbacks).
//!
//! The registry is closed: the policy artifact references a payoff by
//! [`PayoffKind`], a serde-tagged enum, so deserialization can never
//! produce a payoff the engine does not know.

mod barrier;
mod basket;
mod lookback;
mod moving;

pub use barrier::{DoubleBarrierMaxCall, DownAndOutMinPut, UpAndOutCall, UpAndOutMinPut};
pub use basket::{DoubleBarrierRankWeightedBasketCall, DownAndOutBestOfKCall};
pub use lookback::DoubleBarrierLookbackFloatingPut;
pub use moving::{DoubleStepBarrierDispersionCall, StepBarrierCall};

use reservoir_models::{PathBatch, PathView};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing or validating a payoff.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayoffError {
    /// Double-barrier corridor with the lower level at or above the upper.
    #[error("inverted barriers: lower {lower} must be strictly below upper {upper}")]
    InvertedBarriers {
        /// Lower barrier level.
        lower: f32,
        /// Upper barrier level.
        upper: f32,
    },

    /// The payoff requires a different number of underlying assets.
    #[error("payoff '{payoff}' requires {required} asset(s), model has {actual}")]
    WrongAssetCount {
        /// Payoff name.
        payoff: &'static str,
        /// Required asset count (minimum for best-of-k, exact otherwise).
        required: usize,
        /// Asset count offered by the model.
        actual: usize,
    },

    /// Any other invalid payoff parameter.
    #[error("invalid payoff parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        reason: String,
    },
}

/// An exercisable payoff evaluated on truncated path windows.
pub trait Payoff: Send + Sync {
    /// Per-path payoff for the window's evaluation date. Values are
    /// non-negative; knocked-out paths are exactly zero.
    fn eval(&self, view: PathView<'_>) -> Vec<f32>;

    /// Whether the payoff reads history before the evaluation date.
    fn is_path_dependent(&self) -> bool {
        true
    }

    /// Strike used for state normalization; `None` means the engine falls
    /// back to the model spot.
    fn strike(&self) -> Option<f32>;

    /// Barrier levels the engine may append as input features
    /// (lower-then-upper for corridors, initial levels for moving
    /// barriers).
    fn barrier_levels(&self) -> Vec<f32>;

    /// Checks the payoff against the model's asset count.
    fn validate(&self, nb_stocks: usize) -> Result<(), PayoffError>;
}

/// Serializable reference to a payoff in the closed registry.
///
/// This is what the policy artifact stores; [`PayoffKind::build`] turns
/// it back into a live payoff, re-running construction-time validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayoffKind {
    /// Single-asset up-and-out call.
    UpAndOutCall {
        /// Strike price.
        strike: f32,
        /// Upper knock-out barrier.
        barrier: f32,
    },
    /// Down-and-out put on the cross-sectional minimum.
    DownAndOutMinPut {
        /// Strike price.
        strike: f32,
        /// Lower knock-out barrier.
        barrier: f32,
    },
    /// Up-and-out put on the cross-sectional minimum.
    UpAndOutMinPut {
        /// Strike price.
        strike: f32,
        /// Upper knock-out barrier.
        barrier: f32,
    },
    /// Double-barrier call on the cross-sectional maximum.
    DoubleBarrierMaxCall {
        /// Strike price.
        strike: f32,
        /// Upper knock-out barrier.
        barrier_up: f32,
        /// Lower knock-out barrier.
        barrier_down: f32,
    },
    /// Single-asset double-barrier lookback floating-strike put.
    DoubleBarrierLookbackFloatingPut {
        /// Upper knock-out barrier.
        barrier_up: f32,
        /// Lower knock-out barrier.
        barrier_down: f32,
    },
    /// Down-and-out call on the average of the top-k assets.
    DownAndOutBestOfKCall {
        /// Strike price.
        strike: f32,
        /// Lower knock-out barrier.
        barrier: f32,
        /// Number of best performers to average.
        k: usize,
    },
    /// Double-barrier call on a rank-weighted basket of exactly 3 assets.
    DoubleBarrierRankWeightedBasketCall {
        /// Strike price.
        strike: f32,
        /// Upper knock-out barrier.
        barrier_up: f32,
        /// Lower knock-out barrier.
        barrier_down: f32,
    },
    /// Single-asset call with a stochastic moving upper barrier.
    StepBarrierCall {
        /// Strike price.
        strike: f32,
        /// Barrier level at date 0.
        initial_barrier: f32,
        /// Seed of the barrier trajectory.
        seed: u64,
    },
    /// Dispersion call with two stochastic moving barriers.
    DoubleStepBarrierDispersionCall {
        /// Strike on the cross-sectional standard deviation.
        strike: f32,
        /// Upper barrier level at date 0.
        barrier_up: f32,
        /// Lower barrier level at date 0.
        barrier_down: f32,
        /// Seed of the barrier trajectories.
        seed: u64,
    },
}

impl PayoffKind {
    /// Instantiates the referenced payoff, re-running validation.
    pub fn build(&self) -> Result<Box<dyn Payoff>, PayoffError> {
        match *self {
            PayoffKind::UpAndOutCall { strike, barrier } => {
                Ok(Box::new(UpAndOutCall::new(strike, barrier)))
            }
            PayoffKind::DownAndOutMinPut { strike, barrier } => {
                Ok(Box::new(DownAndOutMinPut::new(strike, barrier)))
            }
            PayoffKind::UpAndOutMinPut { strike, barrier } => {
                Ok(Box::new(UpAndOutMinPut::new(strike, barrier)))
            }
            PayoffKind::DoubleBarrierMaxCall {
                strike,
                barrier_up,
                barrier_down,
            } => Ok(Box::new(DoubleBarrierMaxCall::new(
                strike,
                barrier_up,
                barrier_down,
            )?)),
            PayoffKind::DoubleBarrierLookbackFloatingPut {
                barrier_up,
                barrier_down,
            } => Ok(Box::new(DoubleBarrierLookbackFloatingPut::new(
                barrier_up,
                barrier_down,
            )?)),
            PayoffKind::DownAndOutBestOfKCall { strike, barrier, k } => {
                Ok(Box::new(DownAndOutBestOfKCall::new(strike, barrier, k)?))
            }
            PayoffKind::DoubleBarrierRankWeightedBasketCall {
                strike,
                barrier_up,
                barrier_down,
            } => Ok(Box::new(DoubleBarrierRankWeightedBasketCall::new(
                strike,
                barrier_up,
                barrier_down,
            )?)),
            PayoffKind::StepBarrierCall {
                strike,
                initial_barrier,
                seed,
            } => Ok(Box::new(StepBarrierCall::new(strike, initial_barrier, seed))),
            PayoffKind::DoubleStepBarrierDispersionCall {
                strike,
                barrier_up,
                barrier_down,
                seed,
            } => Ok(Box::new(DoubleStepBarrierDispersionCall::new(
                strike,
                barrier_up,
                barrier_down,
                seed,
            )?)),
        }
    }
}

/// Immediate payoffs for every decision date: `matrix[date][path]`.
///
/// Path-dependent payoffs see the full history window ending at each
/// date. Payoffs that declare themselves history-free get the single-date
/// cross-section instead, which keeps the running-extrema scan out of
/// their evaluation.
pub fn payoff_matrix(payoff: &dyn Payoff, paths: &PathBatch) -> Vec<Vec<f32>> {
    let path_dependent = payoff.is_path_dependent();
    (0..=paths.nb_dates())
        .map(|date| {
            let view = if path_dependent {
                paths.view(date)
            } else {
                paths.date_view(date)
            };
            payoff.eval(view)
        })
        .collect()
}

/// Rejects a corridor whose lower level is not strictly below the upper.
pub(crate) fn check_corridor(lower: f32, upper: f32) -> Result<(), PayoffError> {
    if lower >= upper {
        return Err(PayoffError::InvertedBarriers { lower, upper });
    }
    Ok(())
}
