//! Backward-induction policy engine.
//!
//! The engine replays a pre-fitted exercise policy over a path ensemble.
//! One backward sweep per batch: at each policy date the immediate
//! payoff is compared against the regressed continuation value, and
//! exercising paths overwrite their recorded exercise date. Because the
//! sweep runs from maturity toward date 1, the date that survives in the
//! record is the earliest profitable one.

use std::collections::BTreeMap;

use reservoir_core::Reservoir;
use reservoir_models::{PathBatch, RoughHestonParams};
use tracing::debug;

use crate::payoffs::{payoff_matrix, Payoff};
use crate::policy::{PolicyArtifact, PolicyError};

/// Outcome of one backward-induction run.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyResult {
    /// Exercise date per path, in `[0, nb_dates]`; `nb_dates` means the
    /// path was held to maturity.
    pub exercise_dates: Vec<usize>,
    /// Undiscounted payoff at each path's exercise date, non-negative.
    pub payoff_values: Vec<f32>,
    /// Mean discounted value across paths.
    pub price: f64,
}

/// Inference engine for a frozen exercise policy.
pub struct PolicyEngine {
    reservoir: Reservoir,
    coefficients: BTreeMap<usize, Vec<f32>>,
    params: RoughHestonParams,
    payoff: Box<dyn Payoff>,
    use_payoff_as_input: bool,
    /// Barrier levels already normalized by the strike reference.
    barrier_features: Vec<f32>,
    strike_ref: f32,
}

impl PolicyEngine {
    /// Loads an artifact, failing fast on every structural problem.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::MissingPolicy`] when the coefficient map is empty
    /// - [`PolicyError::CoefficientDimension`] when any vector's length
    ///   differs from `hidden_size + 1`
    /// - [`PolicyError::Shape`] when the input width implied by the
    ///   artifact's flags does not match the reservoir
    /// - payoff and model validation errors, converted
    pub fn new(artifact: PolicyArtifact) -> Result<Self, PolicyError> {
        artifact.model.validate()?;
        let payoff = artifact.payoff.build()?;
        payoff.validate(artifact.model.nb_stocks)?;

        if artifact.coefficients.is_empty() {
            return Err(PolicyError::MissingPolicy);
        }
        let expected = artifact.reservoir.hidden_size() + 1;
        for (&date, coeffs) in &artifact.coefficients {
            if coeffs.len() != expected {
                return Err(PolicyError::CoefficientDimension {
                    date,
                    expected,
                    actual: coeffs.len(),
                });
            }
        }

        let strike_ref = payoff.strike().unwrap_or(artifact.model.spot as f32);

        // Barrier features travel with the artifact; when the flag is set
        // but no levels were stored, the payoff's own levels are used.
        let barrier_values = if artifact.barrier_values.is_empty() && artifact.use_barrier_as_input
        {
            payoff.barrier_levels()
        } else {
            artifact.barrier_values
        };
        let barrier_features: Vec<f32> =
            barrier_values.iter().map(|&b| b / strike_ref).collect();

        let state_dim = artifact.model.nb_stocks
            + usize::from(artifact.use_payoff_as_input)
            + barrier_features.len();
        if state_dim != artifact.reservoir.input_dim() {
            return Err(PolicyError::Shape {
                context: "reservoir input width",
                expected: artifact.reservoir.input_dim(),
                actual: state_dim,
            });
        }

        Ok(Self {
            reservoir: artifact.reservoir,
            coefficients: artifact.coefficients,
            params: artifact.model,
            payoff,
            use_payoff_as_input: artifact.use_payoff_as_input,
            barrier_features,
            strike_ref,
        })
    }

    /// Model parameters the policy was fitted against.
    #[inline]
    pub fn params(&self) -> &RoughHestonParams {
        &self.params
    }

    /// Replays the policy over a path ensemble.
    ///
    /// The batch shape must match the fitted model. The run is pure: it
    /// never mutates the engine, and identical batches produce identical
    /// results.
    pub fn run(&self, paths: &PathBatch) -> Result<PolicyResult, PolicyError> {
        if paths.nb_stocks() != self.params.nb_stocks {
            return Err(PolicyError::Shape {
                context: "batch asset count",
                expected: self.params.nb_stocks,
                actual: paths.nb_stocks(),
            });
        }
        if paths.nb_dates() != self.params.nb_dates {
            return Err(PolicyError::Shape {
                context: "batch date count",
                expected: self.params.nb_dates,
                actual: paths.nb_dates(),
            });
        }

        let nb_paths = paths.nb_paths();
        let nb_dates = paths.nb_dates();
        let nb_stocks = paths.nb_stocks();
        debug!(nb_paths, nb_dates, "policy backward induction start");

        // Immediate payoffs for every date upfront: payoffs[date][path].
        let payoffs = payoff_matrix(self.payoff.as_ref(), paths);

        let mut values = payoffs[nb_dates].clone();
        let mut exercise_dates = vec![nb_dates; nb_paths];

        let df = (-self.params.drift * self.params.maturity / nb_dates as f64).exp() as f32;

        let hidden = self.reservoir.hidden_size();
        let state_dim =
            nb_stocks + usize::from(self.use_payoff_as_input) + self.barrier_features.len();
        let mut state = vec![0.0f32; nb_paths * state_dim];

        // Backward from the last early-exercise date to 1. Dates without
        // fitted coefficients are skipped entirely (hold, no discount).
        for date in (1..nb_dates).rev() {
            let Some(coeffs) = self.coefficients.get(&date) else {
                continue;
            };

            for path in 0..nb_paths {
                let row = &mut state[path * state_dim..(path + 1) * state_dim];
                for stock in 0..nb_stocks {
                    row[stock] = paths.spot(path, stock, date) / self.strike_ref;
                }
                let mut col = nb_stocks;
                if self.use_payoff_as_input {
                    row[col] = payoffs[date][path];
                    col += 1;
                }
                row[col..].copy_from_slice(&self.barrier_features);
            }

            let basis = self.reservoir.forward(&state, nb_paths, state_dim)?;

            for path in 0..nb_paths {
                let basis_row = &basis[path * hidden..(path + 1) * hidden];
                let mut continuation = coeffs[hidden];
                for (b, c) in basis_row.iter().zip(coeffs) {
                    continuation += b * c;
                }
                let continuation = continuation.max(0.0);

                let immediate = payoffs[date][path];
                if immediate > continuation {
                    values[path] = immediate;
                    exercise_dates[path] = date;
                } else {
                    values[path] *= df;
                }
            }
        }

        // Date 0: one more discount step, floored by the issue-date payoff.
        let mut price_acc = 0.0f64;
        for path in 0..nb_paths {
            let final_value = payoffs[0][path].max(values[path] * df);
            price_acc += final_value as f64;
        }
        let price = price_acc / nb_paths as f64;

        let payoff_values: Vec<f32> = exercise_dates
            .iter()
            .enumerate()
            .map(|(path, &date)| payoffs[date][path])
            .collect();

        debug!(price, "policy backward induction done");
        Ok(PolicyResult {
            exercise_dates,
            payoff_values,
            price,
        })
    }

    /// Exercise dates only; see [`run`](Self::run).
    pub fn predict_exercise_decisions(
        &self,
        paths: &PathBatch,
    ) -> Result<Vec<usize>, PolicyError> {
        Ok(self.run(paths)?.exercise_dates)
    }
}
