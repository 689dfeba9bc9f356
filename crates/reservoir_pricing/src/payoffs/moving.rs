//! Payoffs with stochastic moving barriers.
//!
//! A moving barrier is a random walk with uniform increments, fixed by a
//! seed embedded in the payoff. The trajectory is a pure function of
//! `(seed, horizon)` and is recomputed in full at every evaluation: a
//! shorter horizon reproduces a prefix of a longer one, so the barrier a
//! path faced at date `t` never changes as the window grows.

use super::{check_corridor, Payoff, PayoffError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reservoir_models::PathView;

/// Appends `steps` uniform increments from `lo..hi` to `initial`.
///
/// Increments are drawn in `f64` and accumulated in `f32`, matching the
/// precision of the stored levels.
fn extend_trajectory(initial: f32, steps: usize, range: (f64, f64), rng: &mut StdRng) -> Vec<f32> {
    let mut path = Vec::with_capacity(steps + 1);
    let mut level = initial;
    path.push(level);
    for _ in 0..steps {
        let step: f64 = rng.gen_range(range.0..range.1);
        level += step as f32;
        path.push(level);
    }
    path
}

/// Single-asset call with a stochastic moving upper barrier.
///
/// The barrier walks as `B(tau+1) = B(tau) + U(-2, 1)`; the path is
/// knocked out the first time `S(tau) >= B(tau)`.
#[derive(Clone, Copy, Debug)]
pub struct StepBarrierCall {
    strike: f32,
    initial_barrier: f32,
    seed: u64,
}

impl StepBarrierCall {
    /// Creates the payoff.
    pub fn new(strike: f32, initial_barrier: f32, seed: u64) -> Self {
        Self {
            strike,
            initial_barrier,
            seed,
        }
    }

    /// Barrier levels for dates `0..horizon`, deterministic in
    /// `(seed, horizon)`.
    pub fn barrier_path(&self, horizon: usize) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        extend_trajectory(self.initial_barrier, horizon - 1, (-2.0, 1.0), &mut rng)
    }
}

impl Payoff for StepBarrierCall {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let barrier = self.barrier_path(view.horizon());
        (0..view.nb_paths())
            .map(|path| {
                let knocked_out = barrier
                    .iter()
                    .enumerate()
                    .any(|(date, &level)| view.price(path, 0, date) >= level);
                if knocked_out {
                    return 0.0;
                }
                (view.price_now(path, 0) - self.strike).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        Some(self.strike)
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.initial_barrier]
    }

    fn validate(&self, nb_stocks: usize) -> Result<(), PayoffError> {
        if nb_stocks != 1 {
            return Err(PayoffError::WrongAssetCount {
                payoff: "StepBarrierCall",
                required: 1,
                actual: nb_stocks,
            });
        }
        Ok(())
    }
}

/// Dispersion call with two stochastic moving barriers.
///
/// Both trajectories come from one seeded stream, lower steps drawn
/// before upper steps: the lower barrier adds `U(-1, 2)` per date, the
/// upper adds `U(-2, 1)`, so the corridor tends to tighten. Knock-out
/// checks the cross-sectional extrema against the levels of each date.
/// The live payoff is the population standard deviation of the
/// cross-section minus the strike.
#[derive(Clone, Copy, Debug)]
pub struct DoubleStepBarrierDispersionCall {
    strike: f32,
    barrier_up: f32,
    barrier_down: f32,
    seed: u64,
}

impl DoubleStepBarrierDispersionCall {
    /// Creates the payoff, rejecting an inverted initial corridor.
    pub fn new(
        strike: f32,
        barrier_up: f32,
        barrier_down: f32,
        seed: u64,
    ) -> Result<Self, PayoffError> {
        check_corridor(barrier_down, barrier_up)?;
        Ok(Self {
            strike,
            barrier_up,
            barrier_down,
            seed,
        })
    }

    /// `(lower, upper)` barrier levels for dates `0..horizon`.
    pub fn barrier_paths(&self, horizon: usize) -> (Vec<f32>, Vec<f32>) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let lower = extend_trajectory(self.barrier_down, horizon - 1, (-1.0, 2.0), &mut rng);
        let upper = extend_trajectory(self.barrier_up, horizon - 1, (-2.0, 1.0), &mut rng);
        (lower, upper)
    }
}

impl Payoff for DoubleStepBarrierDispersionCall {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let (lower, upper) = self.barrier_paths(view.horizon());
        let nb_stocks = view.nb_stocks();
        let mut cross = Vec::with_capacity(nb_stocks);
        (0..view.nb_paths())
            .map(|path| {
                let knocked_out = (0..view.horizon()).any(|date| {
                    view.max_across_stocks(path, date) >= upper[date]
                        || view.min_across_stocks(path, date) <= lower[date]
                });
                if knocked_out {
                    return 0.0;
                }
                view.cross_section(path, &mut cross);
                let mean = cross.iter().map(|&x| x as f64).sum::<f64>() / nb_stocks as f64;
                let var = cross
                    .iter()
                    .map(|&x| (x as f64 - mean).powi(2))
                    .sum::<f64>()
                    / nb_stocks as f64;
                (var.sqrt() as f32 - self.strike).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        Some(self.strike)
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.barrier_down, self.barrier_up]
    }

    fn validate(&self, nb_stocks: usize) -> Result<(), PayoffError> {
        if nb_stocks < 2 {
            return Err(PayoffError::WrongAssetCount {
                payoff: "DoubleStepBarrierDispersionCall",
                required: 2,
                actual: nb_stocks,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use reservoir_models::PathBatch;

    fn single_asset_batch(series: &[&[f32]]) -> PathBatch {
        let nb_dates = series[0].len() - 1;
        let spot: Vec<f32> = series.iter().flat_map(|s| s.iter().copied()).collect();
        let variance = vec![0.02f32; spot.len()];
        PathBatch::from_raw(spot, variance, series.len(), 1, nb_dates).unwrap()
    }

    #[test]
    fn test_trajectory_is_deterministic() {
        let payoff = StepBarrierCall::new(100.0, 120.0, 42);
        assert_eq!(payoff.barrier_path(13), payoff.barrier_path(13));
        assert_eq!(payoff.barrier_path(13)[0], 120.0);
    }

    #[test]
    fn test_trajectory_prefix_property() {
        let payoff = StepBarrierCall::new(100.0, 120.0, 42);
        let short = payoff.barrier_path(5);
        let long = payoff.barrier_path(13);
        assert_eq!(&long[..5], &short[..]);
    }

    #[test]
    fn test_trajectory_steps_within_range() {
        let payoff = StepBarrierCall::new(100.0, 120.0, 7);
        let path = payoff.barrier_path(50);
        for pair in path.windows(2) {
            let step = pair[1] - pair[0];
            assert!((-2.0..1.0).contains(&step), "step {} out of range", step);
        }
    }

    #[test]
    fn test_step_barrier_call_checks_each_date() {
        let payoff = StepBarrierCall::new(100.0, 120.0, 42);
        let barrier = payoff.barrier_path(3);
        // One path that dodges the walk, one that touches it at date 1.
        let alive = &[100.0, barrier[1] - 1.0, 110.0];
        let dead = &[100.0, barrier[1], 110.0];
        let batch = single_asset_batch(&[alive, dead]);
        let values = payoff.eval(batch.view(2));
        assert_eq!(values[0], 10.0);
        assert_eq!(values[1], 0.0);
    }

    #[test]
    fn test_different_seeds_move_differently() {
        let a = StepBarrierCall::new(100.0, 120.0, 1).barrier_path(20);
        let b = StepBarrierCall::new(100.0, 120.0, 2).barrier_path(20);
        assert_ne!(a, b);
    }

    #[test]
    fn test_dispersion_lower_steps_drawn_first() {
        let payoff =
            DoubleStepBarrierDispersionCall::new(5.0, 130.0, 70.0, 42).unwrap();
        let (lower, upper) = payoff.barrier_paths(10);
        assert_eq!(lower[0], 70.0);
        assert_eq!(upper[0], 130.0);
        // The lower walk consumes the head of the stream, so it matches a
        // single-barrier walk with the same seed and range.
        let mut rng = StdRng::seed_from_u64(42);
        let expected_lower = extend_trajectory(70.0, 9, (-1.0, 2.0), &mut rng);
        assert_eq!(lower, expected_lower);
    }

    #[test]
    fn test_dispersion_payoff_is_population_std() {
        let spot = vec![
            100.0, 110.0, // stock 0
            100.0, 90.0, // stock 1
        ];
        let variance = vec![0.02f32; 4];
        let batch = PathBatch::from_raw(spot, variance, 1, 2, 1).unwrap();
        // Barriers far away so the corridor never binds.
        let payoff =
            DoubleStepBarrierDispersionCall::new(3.0, 1.0e4, -1.0e4, 42).unwrap();
        let values = payoff.eval(batch.view(1));
        // Population std of {110, 90} is 10.
        assert_relative_eq!(values[0], 7.0, epsilon = 1e-4);
    }

    #[test]
    fn test_dispersion_knockout_uses_moving_levels() {
        let payoff =
            DoubleStepBarrierDispersionCall::new(1.0, 112.0, 88.0, 42).unwrap();
        let (lower, upper) = payoff.barrier_paths(2);
        let spot = vec![
            100.0, upper[1], // stock 0 touches the moving upper level
            100.0, (lower[1] + upper[1]) / 2.0,
        ];
        let variance = vec![0.02f32; 4];
        let batch = PathBatch::from_raw(spot, variance, 1, 2, 1).unwrap();
        assert_eq!(payoff.eval(batch.view(1)), vec![0.0]);
    }

    #[test]
    fn test_dispersion_rejects_inverted_corridor() {
        assert!(DoubleStepBarrierDispersionCall::new(1.0, 70.0, 130.0, 42).is_err());
    }

    #[test]
    fn test_dispersion_requires_multiple_assets() {
        let payoff =
            DoubleStepBarrierDispersionCall::new(1.0, 130.0, 70.0, 42).unwrap();
        assert!(payoff.validate(1).is_err());
        assert!(payoff.validate(3).is_ok());
    }
}
