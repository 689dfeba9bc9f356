//! Basket payoffs on ranked cross-sections.

use super::{check_corridor, Payoff, PayoffError};
use reservoir_models::PathView;

/// Descending-rank weights for the 3-asset rank-weighted basket.
const RANK_WEIGHTS: [f32; 3] = [0.15, 0.50, 0.35];

/// Down-and-out call on the average of the top-k assets.
#[derive(Clone, Copy, Debug)]
pub struct DownAndOutBestOfKCall {
    strike: f32,
    barrier: f32,
    k: usize,
}

impl DownAndOutBestOfKCall {
    /// Creates the payoff. `k` must be at least 1.
    pub fn new(strike: f32, barrier: f32, k: usize) -> Result<Self, PayoffError> {
        if k == 0 {
            return Err(PayoffError::InvalidParameter {
                name: "k",
                reason: "best-of-k requires k >= 1".to_string(),
            });
        }
        Ok(Self { strike, barrier, k })
    }
}

impl Payoff for DownAndOutBestOfKCall {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let mut cross = Vec::with_capacity(view.nb_stocks());
        (0..view.nb_paths())
            .map(|path| {
                if view.running_min(path) <= self.barrier {
                    return 0.0;
                }
                view.cross_section(path, &mut cross);
                cross.sort_unstable_by(|a, b| b.total_cmp(a));
                // Views narrower than k (rejected by validate, but eval
                // must not panic on them) average what is available.
                let k = self.k.min(cross.len());
                let top_k_avg: f32 = cross[..k].iter().sum::<f32>() / k as f32;
                (top_k_avg - self.strike).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        Some(self.strike)
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.barrier]
    }

    fn validate(&self, nb_stocks: usize) -> Result<(), PayoffError> {
        if nb_stocks < self.k {
            return Err(PayoffError::WrongAssetCount {
                payoff: "DownAndOutBestOfKCall",
                required: self.k,
                actual: nb_stocks,
            });
        }
        Ok(())
    }
}

/// Double-barrier call on a rank-weighted basket of exactly 3 assets.
///
/// The cross-section at the evaluation date is sorted descending and
/// weighted `[0.15, 0.50, 0.35]` for first, second and third place.
#[derive(Clone, Copy, Debug)]
pub struct DoubleBarrierRankWeightedBasketCall {
    strike: f32,
    barrier_up: f32,
    barrier_down: f32,
}

impl DoubleBarrierRankWeightedBasketCall {
    /// Creates the payoff, rejecting an inverted corridor.
    pub fn new(strike: f32, barrier_up: f32, barrier_down: f32) -> Result<Self, PayoffError> {
        check_corridor(barrier_down, barrier_up)?;
        Ok(Self {
            strike,
            barrier_up,
            barrier_down,
        })
    }
}

impl Payoff for DoubleBarrierRankWeightedBasketCall {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let mut cross = Vec::with_capacity(3);
        (0..view.nb_paths())
            .map(|path| {
                if view.running_max(path) >= self.barrier_up
                    || view.running_min(path) <= self.barrier_down
                {
                    return 0.0;
                }
                view.cross_section(path, &mut cross);
                cross.sort_unstable_by(|a, b| b.total_cmp(a));
                let basket: f32 = cross
                    .iter()
                    .zip(RANK_WEIGHTS)
                    .map(|(&price, weight)| price * weight)
                    .sum();
                (basket - self.strike).max(0.0)
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
        if nb_stocks != 3 {
            return Err(PayoffError::WrongAssetCount {
                payoff: "DoubleBarrierRankWeightedBasketCall",
                required: 3,
                actual: nb_stocks,
            });
        }
        Ok(())
    }
}
