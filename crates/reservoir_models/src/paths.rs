//! Owned path ensembles and borrowed truncated views.
//!
//! # Memory layout
//!
//! Both tensors are stored flat in row-major `(path, stock, date)` order:
//! `values[(path * nb_stocks + stock) * (nb_dates + 1) + date]`, with
//! `date = 0` holding the issue-date value. A `(path, stock)` pair is one
//! contiguous "unit" slice, which is what the simulator parallelises over.

use crate::error::ModelError;

/// An ensemble of correlated spot and variance paths.
///
/// Produced by a simulator; immutable once returned. Shape is
/// `(nb_paths, nb_stocks, nb_dates + 1)` in `f32`.
#[derive(Clone, Debug, PartialEq)]
pub struct PathBatch {
    spot: Vec<f32>,
    variance: Vec<f32>,
    nb_paths: usize,
    nb_stocks: usize,
    nb_dates: usize,
}

impl PathBatch {
    /// Assembles a batch from flat spot and variance buffers.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] if either buffer length
    /// differs from `nb_paths * nb_stocks * (nb_dates + 1)`.
    pub fn from_raw(
        spot: Vec<f32>,
        variance: Vec<f32>,
        nb_paths: usize,
        nb_stocks: usize,
        nb_dates: usize,
    ) -> Result<Self, ModelError> {
        let expected = nb_paths * nb_stocks * (nb_dates + 1);
        for (name, len) in [("spot", spot.len()), ("variance", variance.len())] {
            if len != expected {
                return Err(ModelError::InvalidParameter {
                    name,
                    reason: format!("buffer length {} does not match shape {}", len, expected),
                });
            }
        }
        Ok(Self {
            spot,
            variance,
            nb_paths,
            nb_stocks,
            nb_dates,
        })
    }

    /// Number of paths in the batch.
    #[inline]
    pub fn nb_paths(&self) -> usize {
        self.nb_paths
    }

    /// Number of assets per path.
    #[inline]
    pub fn nb_stocks(&self) -> usize {
        self.nb_stocks
    }

    /// Number of decision dates (the date axis has `nb_dates + 1` points).
    #[inline]
    pub fn nb_dates(&self) -> usize {
        self.nb_dates
    }

    #[inline]
    fn stride(&self) -> usize {
        self.nb_dates + 1
    }

    /// Spot price for `(path, stock, date)`.
    #[inline]
    pub fn spot(&self, path: usize, stock: usize, date: usize) -> f32 {
        self.spot[(path * self.nb_stocks + stock) * self.stride() + date]
    }

    /// Variance for `(path, stock, date)`.
    #[inline]
    pub fn variance(&self, path: usize, stock: usize, date: usize) -> f32 {
        self.variance[(path * self.nb_stocks + stock) * self.stride() + date]
    }

    /// Full spot series for one `(path, stock)` unit.
    #[inline]
    pub fn spot_series(&self, path: usize, stock: usize) -> &[f32] {
        let start = (path * self.nb_stocks + stock) * self.stride();
        &self.spot[start..start + self.stride()]
    }

    /// Raw spot buffer (for bit-level reproducibility checks).
    #[inline]
    pub fn spot_raw(&self) -> &[f32] {
        &self.spot
    }

    /// Raw variance buffer.
    #[inline]
    pub fn variance_raw(&self) -> &[f32] {
        &self.variance
    }

    /// A view truncated to dates `0..=date`.
    ///
    /// # Panics
    ///
    /// Panics if `date > nb_dates`.
    #[inline]
    pub fn view(&self, date: usize) -> PathView<'_> {
        assert!(date <= self.nb_dates, "view date beyond batch horizon");
        PathView {
            batch: self,
            start: 0,
            horizon: date + 1,
        }
    }

    /// A window holding only the cross-section at `date`: what a payoff
    /// that declares itself independent of history gets to see.
    ///
    /// # Panics
    ///
    /// Panics if `date > nb_dates`.
    #[inline]
    pub fn date_view(&self, date: usize) -> PathView<'_> {
        assert!(date <= self.nb_dates, "view date beyond batch horizon");
        PathView {
            batch: self,
            start: date,
            horizon: date + 1,
        }
    }

    /// Returns a new batch with the path axis permuted: path `i` of the
    /// result is path `perm[i]` of `self`. Used to verify permutation
    /// equivariance of downstream consumers.
    pub fn permuted(&self, perm: &[usize]) -> Result<Self, ModelError> {
        if perm.len() != self.nb_paths {
            return Err(ModelError::InvalidParameter {
                name: "perm",
                reason: format!("length {} != nb_paths {}", perm.len(), self.nb_paths),
            });
        }
        let row = self.nb_stocks * self.stride();
        let mut spot = Vec::with_capacity(self.spot.len());
        let mut variance = Vec::with_capacity(self.variance.len());
        for &src in perm {
            spot.extend_from_slice(&self.spot[src * row..(src + 1) * row]);
            variance.extend_from_slice(&self.variance[src * row..(src + 1) * row]);
        }
        Self::from_raw(spot, variance, self.nb_paths, self.nb_stocks, self.nb_dates)
    }
}

/// A borrowed window over a [`PathBatch`], spanning dates
/// `start..horizon`. Payoffs evaluate against views so that "history up
/// to the evaluation date" is expressed in the type rather than by
/// copying; [`PathBatch::date_view`] narrows the window to a single date.
#[derive(Clone, Copy, Debug)]
pub struct PathView<'a> {
    batch: &'a PathBatch,
    start: usize,
    horizon: usize,
}

impl<'a> PathView<'a> {
    /// Number of paths.
    #[inline]
    pub fn nb_paths(&self) -> usize {
        self.batch.nb_paths
    }

    /// Number of assets.
    #[inline]
    pub fn nb_stocks(&self) -> usize {
        self.batch.nb_stocks
    }

    /// Number of visible dates (the evaluation date is `horizon() - 1`).
    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// First visible date.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Spot price at `(path, stock, date)` with `date` inside the window.
    #[inline]
    pub fn price(&self, path: usize, stock: usize, date: usize) -> f32 {
        debug_assert!(self.start <= date && date < self.horizon);
        self.batch.spot(path, stock, date)
    }

    /// Spot price at the evaluation date.
    #[inline]
    pub fn price_now(&self, path: usize, stock: usize) -> f32 {
        self.batch.spot(path, stock, self.horizon - 1)
    }

    /// Running maximum over all assets and all visible dates of one path.
    pub fn running_max(&self, path: usize) -> f32 {
        let mut max = f32::NEG_INFINITY;
        for stock in 0..self.batch.nb_stocks {
            for date in self.start..self.horizon {
                max = max.max(self.batch.spot(path, stock, date));
            }
        }
        max
    }

    /// Running minimum over all assets and all visible dates of one path.
    pub fn running_min(&self, path: usize) -> f32 {
        let mut min = f32::INFINITY;
        for stock in 0..self.batch.nb_stocks {
            for date in self.start..self.horizon {
                min = min.min(self.batch.spot(path, stock, date));
            }
        }
        min
    }

    /// Maximum across assets at one visible date.
    pub fn max_across_stocks(&self, path: usize, date: usize) -> f32 {
        debug_assert!(self.start <= date && date < self.horizon);
        (0..self.batch.nb_stocks)
            .map(|s| self.batch.spot(path, s, date))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Minimum across assets at one visible date.
    pub fn min_across_stocks(&self, path: usize, date: usize) -> f32 {
        debug_assert!(self.start <= date && date < self.horizon);
        (0..self.batch.nb_stocks)
            .map(|s| self.batch.spot(path, s, date))
            .fold(f32::INFINITY, f32::min)
    }

    /// Cross-section at the evaluation date, collected into a buffer.
    pub fn cross_section(&self, path: usize, out: &mut Vec<f32>) {
        out.clear();
        for stock in 0..self.batch.nb_stocks {
            out.push(self.price_now(path, stock));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_batch() -> PathBatch {
        // 2 paths, 2 stocks, 2 dates (3 points each).
        let spot = vec![
            100.0, 105.0, 110.0, // path 0, stock 0
            100.0, 95.0, 90.0, // path 0, stock 1
            100.0, 120.0, 80.0, // path 1, stock 0
            100.0, 100.0, 100.0, // path 1, stock 1
        ];
        let variance = vec![0.02f32; 12];
        PathBatch::from_raw(spot, variance, 2, 2, 2).unwrap()
    }

    #[test]
    fn test_from_raw_rejects_bad_length() {
        let result = PathBatch::from_raw(vec![0.0; 5], vec![0.0; 12], 2, 2, 2);
        assert!(matches!(result, Err(ModelError::InvalidParameter { .. })));
    }

    #[test]
    fn test_indexing() {
        let batch = small_batch();
        assert_eq!(batch.spot(0, 0, 1), 105.0);
        assert_eq!(batch.spot(1, 0, 2), 80.0);
        assert_eq!(batch.spot_series(0, 1), &[100.0, 95.0, 90.0]);
    }

    #[test]
    fn test_view_truncation() {
        let batch = small_batch();
        let view = batch.view(1);
        assert_eq!(view.horizon(), 2);
        assert_eq!(view.price_now(1, 0), 120.0);
        // Truncated view must not see date 2.
        assert_eq!(view.running_max(1), 120.0);
        assert_eq!(batch.view(2).running_min(1), 80.0);
    }

    #[test]
    fn test_date_view_hides_history() {
        let batch = small_batch();
        let view = batch.date_view(2);
        assert_eq!(view.start(), 2);
        assert_eq!(view.horizon(), 3);
        // Path 1 stock 0 spiked to 120 at date 1; the single-date window
        // must not see it.
        assert_eq!(view.running_max(1), 100.0);
        assert_eq!(view.running_min(1), 80.0);
        assert_eq!(view.price_now(1, 0), 80.0);
    }

    #[test]
    fn test_running_extrema_span_stocks_and_dates() {
        let batch = small_batch();
        let view = batch.view(2);
        assert_eq!(view.running_max(0), 110.0);
        assert_eq!(view.running_min(0), 90.0);
    }

    #[test]
    fn test_cross_section() {
        let batch = small_batch();
        let mut buf = Vec::new();
        batch.view(2).cross_section(0, &mut buf);
        assert_eq!(buf, vec![110.0, 90.0]);
    }

    #[test]
    fn test_permuted_swaps_paths() {
        let batch = small_batch();
        let swapped = batch.permuted(&[1, 0]).unwrap();
        assert_eq!(swapped.spot(0, 0, 1), 120.0);
        assert_eq!(swapped.spot(1, 0, 1), 105.0);
        // Double swap restores the original.
        assert_eq!(swapped.permuted(&[1, 0]).unwrap(), batch);
    }
}
