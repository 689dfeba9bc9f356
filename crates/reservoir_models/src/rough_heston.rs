//! Rough Heston path simulation.
//!
//! The variance process follows a fractional (Volterra) recursion with
//! Hurst exponent H in (0, 0.5), producing rougher variance paths than the
//! classical square-root diffusion. Prices evolve by a log-space Euler
//! step at a `nb_steps_mult`-times-finer resolution than the decision
//! grid, then get downsampled to the decision dates.
//!
//! # Cost
//!
//! The fractional step at fine index `k` convolves the whole history
//! `j < k` with the power kernel `(dt*(k-j))^(H-0.5)`, so a unit costs
//! O(steps^2). Units (path-asset columns) are independent and are
//! simulated in parallel; the step loop itself is strictly sequential and
//! must not be reordered.

use crate::error::{ModelError, MAX_PATHS};
use crate::paths::PathBatch;
use crate::rng::SimRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::function::gamma::gamma;

/// Immutable rough Heston configuration.
///
/// `drift` is the risk-free rate used for discounting; the simulated
/// log-price drift is `drift - dividend`. When `v0` is `None` the
/// variance process starts at its long-run mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoughHestonParams {
    /// Risk-free rate (r).
    pub drift: f64,
    /// Volatility of the variance process.
    pub volatility: f64,
    /// Long-run variance (theta).
    pub mean: f64,
    /// Mean-reversion speed (lambda).
    pub speed: f64,
    /// Correlation between the price and variance drivers.
    pub correlation: f64,
    /// Hurst exponent, strictly inside (0, 0.5).
    pub hurst: f64,
    /// Initial stock price.
    pub spot: f64,
    /// Initial variance; defaults to `mean` when absent.
    pub v0: Option<f64>,
    /// Continuous dividend yield.
    pub dividend: f64,
    /// Number of assets per path.
    pub nb_stocks: usize,
    /// Default number of paths per call.
    pub nb_paths: usize,
    /// Number of decision (exercise) dates.
    pub nb_dates: usize,
    /// Time to maturity in years.
    pub maturity: f64,
    /// Fine-step multiplier: simulation runs on `nb_dates * nb_steps_mult`
    /// steps.
    pub nb_steps_mult: usize,
}

impl Default for RoughHestonParams {
    fn default() -> Self {
        Self {
            drift: 0.05,
            volatility: 0.2,
            mean: 0.026,
            speed: 0.3,
            correlation: -0.7,
            hurst: 0.25,
            spot: 100.0,
            v0: Some(0.026),
            dividend: 0.0,
            nb_stocks: 1,
            nb_paths: 1_000,
            nb_dates: 10,
            maturity: 1.0,
            nb_steps_mult: 10,
        }
    }
}

impl RoughHestonParams {
    /// Effective initial variance.
    #[inline]
    pub fn initial_variance(&self) -> f64 {
        self.v0.unwrap_or(self.mean)
    }

    /// Fine time step: `maturity / (nb_dates * nb_steps_mult)`.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.maturity / (self.nb_dates * self.nb_steps_mult) as f64
    }

    /// Validates the configuration, failing fast before any simulation.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.hurst > 0.0 && self.hurst < 0.5) {
            return Err(ModelError::InvalidHurst(self.hurst));
        }
        if !(-1.0..=1.0).contains(&self.correlation) {
            return Err(ModelError::InvalidCorrelation(self.correlation));
        }
        if self.nb_paths == 0 || self.nb_paths > MAX_PATHS {
            return Err(ModelError::InvalidPathCount(self.nb_paths));
        }
        let positive: [(&'static str, f64); 2] =
            [("spot", self.spot), ("maturity", self.maturity)];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ModelError::InvalidParameter {
                    name,
                    reason: format!("{} must be positive and finite", value),
                });
            }
        }
        let non_negative: [(&'static str, f64); 4] = [
            ("volatility", self.volatility),
            ("mean", self.mean),
            ("speed", self.speed),
            ("v0", self.initial_variance()),
        ];
        for (name, value) in non_negative {
            if value < 0.0 || !value.is_finite() {
                return Err(ModelError::InvalidParameter {
                    name,
                    reason: format!("{} must be non-negative and finite", value),
                });
            }
        }
        let counts: [(&'static str, usize); 3] = [
            ("nb_stocks", self.nb_stocks),
            ("nb_dates", self.nb_dates),
            ("nb_steps_mult", self.nb_steps_mult),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ModelError::InvalidParameter {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Rough Heston path simulator.
///
/// Construction validates the parameters once; `generate_paths` then runs
/// without further checks beyond the per-call path cap.
pub struct RoughHeston {
    params: RoughHestonParams,
    /// Dividend-adjusted log-price drift.
    mu: f64,
    dt: f64,
    /// `gamma(H + 0.5)`, the fractional-kernel normaliser.
    gamma_norm: f64,
}

impl RoughHeston {
    /// Creates a simulator from validated parameters.
    pub fn new(params: RoughHestonParams) -> Result<Self, ModelError> {
        params.validate()?;
        Ok(Self {
            mu: params.drift - params.dividend,
            dt: params.dt(),
            gamma_norm: gamma(params.hurst + 0.5),
            params,
        })
    }

    /// Returns the configuration.
    #[inline]
    pub fn params(&self) -> &RoughHestonParams {
        &self.params
    }

    /// Discount factor between two decision-date indices.
    ///
    /// Accepts the indices in either order; reversing them yields the
    /// reciprocal (a capitalisation factor).
    #[inline]
    pub fn disc_factor(&self, date_begin: usize, date_end: usize) -> f64 {
        let elapsed = date_end as f64 - date_begin as f64;
        let time = elapsed * self.dt * self.params.nb_steps_mult as f64;
        (-self.params.drift * time).exp()
    }

    /// One-period discount factor on the decision grid.
    #[inline]
    pub fn one_period_discount(&self) -> f64 {
        (-self.params.drift * self.params.maturity / self.params.nb_dates as f64).exp()
    }

    /// Generates correlated spot and variance path ensembles.
    ///
    /// `nb_paths` and `nb_dates` default to the configured values. The
    /// same `(seed, params)` pair produces bit-identical `f32` output on
    /// every call, independent of thread count: all normal variates are
    /// drawn up front from a local seeded stream (first the price block,
    /// then the variance block, each laid out step-major) and every
    /// path-asset unit reads a disjoint column.
    pub fn generate_paths(
        &self,
        nb_paths: Option<usize>,
        nb_dates: Option<usize>,
        seed: u64,
    ) -> Result<PathBatch, ModelError> {
        let nb_paths = nb_paths.unwrap_or(self.params.nb_paths);
        let nb_dates = nb_dates.unwrap_or(self.params.nb_dates);
        if nb_paths == 0 || nb_paths > MAX_PATHS {
            return Err(ModelError::InvalidPathCount(nb_paths));
        }
        if nb_dates == 0 {
            return Err(ModelError::InvalidParameter {
                name: "nb_dates",
                reason: "must be at least 1".to_string(),
            });
        }

        let mult = self.params.nb_steps_mult;
        let nb_stocks = self.params.nb_stocks;
        let nb_steps = nb_dates * mult;
        let units = nb_paths * nb_stocks;

        // Draw both normal blocks up front, step-major: index [step][unit].
        let mut rng = SimRng::from_seed(seed);
        let mut z1 = vec![0.0f32; nb_steps * units];
        let mut z2 = vec![0.0f32; nb_steps * units];
        rng.fill_normal(&mut z1);
        rng.fill_normal(&mut z2);

        // Power kernel (d*dt)^(H - 0.5), d = 1..=nb_steps, in f64.
        let h = self.params.hurst;
        let kernel: Vec<f64> = (1..=nb_steps)
            .map(|d| (self.dt * d as f64).powf(h - 0.5))
            .collect();

        let sqrt_dt = self.dt.sqrt() as f32;
        let rho = self.params.correlation as f32;
        let rho_perp = (1.0 - self.params.correlation * self.params.correlation).sqrt() as f32;

        let stride = nb_dates + 1;
        let mut spot_out = vec![0.0f32; units * stride];
        let mut var_out = vec![0.0f32; units * stride];

        let ctx = UnitContext {
            z1: &z1,
            z2: &z2,
            kernel: &kernel,
            units,
            nb_steps,
            mult,
            sqrt_dt,
            rho,
            rho_perp,
            dt: self.dt,
            mu: self.mu,
            speed: self.params.speed,
            mean: self.params.mean,
            volatility: self.params.volatility,
            spot: self.params.spot as f32,
            v0: self.params.initial_variance() as f32,
            gamma_norm: self.gamma_norm,
        };

        spot_out
            .par_chunks_mut(stride)
            .zip(var_out.par_chunks_mut(stride))
            .enumerate()
            .for_each(|(unit, (spot_unit, var_unit))| {
                simulate_unit(unit, &ctx, spot_unit, var_unit);
            });

        PathBatch::from_raw(spot_out, var_out, nb_paths, nb_stocks, nb_dates)
    }
}

/// Read-only per-call state shared by all units.
struct UnitContext<'a> {
    z1: &'a [f32],
    z2: &'a [f32],
    kernel: &'a [f64],
    units: usize,
    nb_steps: usize,
    mult: usize,
    sqrt_dt: f32,
    rho: f32,
    rho_perp: f32,
    dt: f64,
    mu: f64,
    speed: f64,
    mean: f64,
    volatility: f64,
    spot: f32,
    v0: f32,
    gamma_norm: f64,
}

/// Simulates one path-asset column on the fine grid and downsamples it
/// into the decision-grid output slices.
fn simulate_unit(unit: usize, ctx: &UnitContext<'_>, spot_out: &mut [f32], var_out: &mut [f32]) {
    let n = ctx.nb_steps;

    // Correlated variance-driving increments for this unit.
    let mut dz = vec![0.0f32; n];
    for (step, dz_k) in dz.iter_mut().enumerate() {
        let a = ctx.z1[step * ctx.units + unit];
        let b = ctx.z2[step * ctx.units + unit];
        *dz_k = (ctx.rho * a + ctx.rho_perp * b) * ctx.sqrt_dt;
    }

    let mut spot_fine = vec![0.0f32; n + 1];
    let mut var_fine = vec![0.0f32; n + 1];
    spot_fine[0] = ctx.spot;
    var_fine[0] = ctx.v0;
    let v0 = ctx.v0 as f64;

    for k in 1..=n {
        // Log-Euler price step driven by the current (floored) variance.
        let v_prev = var_fine[k - 1].max(0.0);
        let dw = ctx.z1[(k - 1) * ctx.units + unit] * ctx.sqrt_dt;
        let drift_term = ((ctx.mu - 0.5 * v_prev as f64) * ctx.dt) as f32;
        spot_fine[k] = (spot_fine[k - 1].ln() + drift_term + v_prev.sqrt() * dw).exp();

        // Fractional variance step: convolve the whole history with the
        // power kernel, normalise by gamma(H + 0.5), floor at zero.
        let mut acc = 0.0f64;
        for j in 0..k {
            let w = ctx.kernel[k - j - 1];
            let vj = var_fine[j] as f64;
            acc += w * (ctx.speed * (ctx.mean - vj) * ctx.dt + ctx.volatility * vj.sqrt() * dz[j] as f64);
        }
        var_fine[k] = (v0 + acc / ctx.gamma_norm).max(0.0) as f32;
    }

    // Keep every `mult`-th fine step.
    for (d, (s_out, v_out)) in spot_out.iter_mut().zip(var_out.iter_mut()).enumerate() {
        *s_out = spot_fine[d * ctx.mult];
        *v_out = var_fine[d * ctx.mult];
    }
}
