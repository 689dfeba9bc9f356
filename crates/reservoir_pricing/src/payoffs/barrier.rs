//! Fixed-level barrier payoffs.
//!
//! Knock-out comparisons are inclusive: an upper barrier knocks out when
//! the running maximum reaches the level (`>=`), a lower one when the
//! running minimum reaches it (`<=`). Surviving paths therefore stay
//! strictly inside the barrier.

use super::{check_corridor, Payoff, PayoffError};
use reservoir_models::PathView;

/// Single-asset up-and-out call.
///
/// Pays `max(S_t - K, 0)` unless the price ever reached the barrier.
#[derive(Clone, Copy, Debug)]
pub struct UpAndOutCall {
    strike: f32,
    barrier: f32,
}

impl UpAndOutCall {
    /// Creates the payoff.
    pub fn new(strike: f32, barrier: f32) -> Self {
        Self { strike, barrier }
    }
}

impl Payoff for UpAndOutCall {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        (0..view.nb_paths())
            .map(|path| {
                if view.running_max(path) >= self.barrier {
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
        vec![self.barrier]
    }

    fn validate(&self, nb_stocks: usize) -> Result<(), PayoffError> {
        if nb_stocks != 1 {
            return Err(PayoffError::WrongAssetCount {
                payoff: "UpAndOutCall",
                required: 1,
                actual: nb_stocks,
            });
        }
        Ok(())
    }
}

/// Down-and-out put on the cross-sectional minimum.
///
/// Knocked out when any asset ever touched the lower barrier; otherwise
/// pays `max(K - min_i S_i(t), 0)`.
#[derive(Clone, Copy, Debug)]
pub struct DownAndOutMinPut {
    strike: f32,
    barrier: f32,
}

impl DownAndOutMinPut {
    /// Creates the payoff.
    pub fn new(strike: f32, barrier: f32) -> Self {
        Self { strike, barrier }
    }
}

impl Payoff for DownAndOutMinPut {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let last = view.horizon() - 1;
        (0..view.nb_paths())
            .map(|path| {
                if view.running_min(path) <= self.barrier {
                    return 0.0;
                }
                (self.strike - view.min_across_stocks(path, last)).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        Some(self.strike)
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.barrier]
    }

    fn validate(&self, _nb_stocks: usize) -> Result<(), PayoffError> {
        Ok(())
    }
}

/// Up-and-out put on the cross-sectional minimum.
///
/// The put leg rewards the worst performer while the upper barrier
/// punishes any asset rallying to the level.
#[derive(Clone, Copy, Debug)]
pub struct UpAndOutMinPut {
    strike: f32,
    barrier: f32,
}

impl UpAndOutMinPut {
    /// Creates the payoff.
    pub fn new(strike: f32, barrier: f32) -> Self {
        Self { strike, barrier }
    }

    /// Conventional parameterisation with the barrier at `1.2 * strike`.
    pub fn with_default_barrier(strike: f32) -> Self {
        Self::new(strike, strike * 1.2)
    }
}

impl Payoff for UpAndOutMinPut {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let last = view.horizon() - 1;
        (0..view.nb_paths())
            .map(|path| {
                if view.running_max(path) >= self.barrier {
                    return 0.0;
                }
                (self.strike - view.min_across_stocks(path, last)).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        Some(self.strike)
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.barrier]
    }

    fn validate(&self, _nb_stocks: usize) -> Result<(), PayoffError> {
        Ok(())
    }
}

/// Double-barrier call on the cross-sectional maximum.
#[derive(Clone, Copy, Debug)]
pub struct DoubleBarrierMaxCall {
    strike: f32,
    barrier_up: f32,
    barrier_down: f32,
}

impl DoubleBarrierMaxCall {
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

impl Payoff for DoubleBarrierMaxCall {
    fn eval(&self, view: PathView<'_>) -> Vec<f32> {
        let last = view.horizon() - 1;
        (0..view.nb_paths())
            .map(|path| {
                if view.running_max(path) >= self.barrier_up
                    || view.running_min(path) <= self.barrier_down
                {
                    return 0.0;
                }
                (view.max_across_stocks(path, last) - self.strike).max(0.0)
            })
            .collect()
    }

    fn strike(&self) -> Option<f32> {
        Some(self.strike)
    }

    fn barrier_levels(&self) -> Vec<f32> {
        vec![self.barrier_down, self.barrier_up]
    }

    fn validate(&self, _nb_stocks: usize) -> Result<(), PayoffError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_models::PathBatch;

    fn single_asset_batch(series: &[&[f32]]) -> PathBatch {
        let nb_dates = series[0].len() - 1;
        let spot: Vec<f32> = series.iter().flat_map(|s| s.iter().copied()).collect();
        let variance = vec![0.02f32; spot.len()];
        PathBatch::from_raw(spot, variance, series.len(), 1, nb_dates).unwrap()
    }

    #[test]
    fn test_up_and_out_call_knockout_is_permanent() {
        // Path 0 breaches 120 at date 2 then falls back; stays zero.
        // Path 1 never breaches and finishes in the money.
        let batch = single_asset_batch(&[
            &[100.0, 110.0, 125.0, 112.0],
            &[100.0, 105.0, 110.0, 115.0],
        ]);
        let payoff = UpAndOutCall::new(100.0, 120.0);
        let values = payoff.eval(batch.view(3));
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 15.0);
    }

    #[test]
    fn test_up_and_out_call_touch_knocks_out() {
        let batch = single_asset_batch(&[&[100.0, 120.0, 110.0]]);
        let payoff = UpAndOutCall::new(100.0, 120.0);
        assert_eq!(payoff.eval(batch.view(2)), vec![0.0]);
    }

    #[test]
    fn test_up_and_out_call_window_truncation() {
        // Breach happens at date 3; a window ending at date 2 is alive.
        let batch = single_asset_batch(&[&[100.0, 105.0, 111.0, 130.0]]);
        let payoff = UpAndOutCall::new(100.0, 120.0);
        assert_eq!(payoff.eval(batch.view(2)), vec![11.0]);
        assert_eq!(payoff.eval(batch.view(3)), vec![0.0]);
    }

    #[test]
    fn test_up_and_out_call_requires_single_asset() {
        let payoff = UpAndOutCall::new(100.0, 120.0);
        assert!(payoff.validate(1).is_ok());
        assert!(matches!(
            payoff.validate(3),
            Err(PayoffError::WrongAssetCount { actual: 3, .. })
        ));
    }

    #[test]
    fn test_down_and_out_min_put_uses_worst_asset() {
        // 1 path, 2 stocks: stock 1 dips to 85 but stays above barrier 80.
        let spot = vec![
            100.0, 95.0, 92.0, // stock 0
            100.0, 85.0, 88.0, // stock 1
        ];
        let variance = vec![0.02f32; 6];
        let batch = PathBatch::from_raw(spot, variance, 1, 2, 2).unwrap();
        let payoff = DownAndOutMinPut::new(100.0, 80.0);
        let values = payoff.eval(batch.view(2));
        // Put on the minimum at t: min(92, 88) = 88.
        assert_eq!(values, vec![12.0]);

        let knocked = DownAndOutMinPut::new(100.0, 85.0);
        assert_eq!(knocked.eval(batch.view(2)), vec![0.0]);
    }

    #[test]
    fn test_double_barrier_max_call_corridor() {
        let batch = single_asset_batch(&[
            &[100.0, 108.0, 112.0], // survives in (90, 115)
            &[100.0, 116.0, 112.0], // breaches up
            &[100.0, 89.0, 112.0],  // breaches down
        ]);
        let payoff = DoubleBarrierMaxCall::new(100.0, 115.0, 90.0).unwrap();
        let values = payoff.eval(batch.view(2));
        assert_eq!(values, vec![12.0, 0.0, 0.0]);
    }

    #[test]
    fn test_double_barrier_rejects_inverted() {
        let err = DoubleBarrierMaxCall::new(100.0, 90.0, 110.0).unwrap_err();
        assert_eq!(
            err,
            PayoffError::InvertedBarriers {
                lower: 110.0,
                upper: 90.0
            }
        );
        // Equal levels are inverted too.
        assert!(DoubleBarrierMaxCall::new(100.0, 100.0, 100.0).is_err());
    }

    #[test]
    fn test_barrier_levels_order() {
        let payoff = DoubleBarrierMaxCall::new(100.0, 115.0, 90.0).unwrap();
        assert_eq!(payoff.barrier_levels(), vec![90.0, 115.0]);
    }
}
