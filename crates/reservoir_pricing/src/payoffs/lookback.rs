//! Lookback payoffs with knock-out corridors.

use super::{check_corridor, Payoff, PayoffError};
use reservoir_models::PathView;

/// Single-asset double-barrier lookback floating-strike put.
///
/// Pays `max(running_max - S_t, 0)` while the price has stayed strictly
/// inside the corridor. Carries no strike of its own: the engine
/// normalizes states by the model spot instead.
#[derive(Clone, Copy, Debug)]
pub struct DoubleBarrierLookbackFloatingPut {
    barrier_up: f32,
    barrier_down: f32,
}

impl DoubleBarrierLookbackFloatingPut {
    /// Creates the payoff, rejecting an inverted corridor.
    pub fn new(barrier_up: f32, barrier_down: f32) -> Result<Self, PayoffError> {
        check_corridor(barrier_down, barrier_up)?;
        Ok(Self {
            barrier_up,
            barrier_down,
        })
    }
}

impl Payoff for DoubleBarrierLookbackFloatingPut {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        (0..view.nb_paths())
            .map(|path| {
                let max = view.running_max(path);
                let min = view.running_min(path);
                if max >= self.barrier_up || min <= self.barrier_down {
                    return 0.0;
                }
                (max - view.price_now(path, 0)).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        None
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.barrier_down, self.barrier_up]
    }

    fn validate(&self, nb_stocks: usize) -> Result<(), PayoffError> {
        if nb_stocks != 1 {
            return Err(PayoffError::WrongAssetCount {
                payoff: "DoubleBarrierLookbackFloatingPut",
                required: 1,
                actual: nb_stocks,
            });
        }
        Ok(())
    }
}
