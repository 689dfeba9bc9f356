//! Scalar activation functions for the reservoir forward pass.
//!
//! The GELU implementation uses the exact error-function formula
//! `x * 0.5 * (1 + erf(x / sqrt(2)))`, never the tanh approximation.
//! Downstream regression coefficients reach magnitudes of order 1e4, so a
//! 1e-3 activation deviation would surface as a price error of several
//! currency units. The erf evaluation is done in `f64` and truncated to
//! `f32` on the way out.

use serde::{Deserialize, Serialize};
use statrs::function::erf::erf;

/// Negative slope used by the leaky ReLU variant.
const LEAKY_SLOPE: f32 = 0.5;

/// Softplus switches to the identity above this input to avoid overflow.
const SOFTPLUS_THRESHOLD: f32 = 20.0;

/// Activation function applied after every reservoir layer.
///
/// Tag names match the serialized artifact format (lower-case, no
/// separators), so `"leakyrelu"` round-trips to [`Activation::LeakyRelu`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Gaussian Error Linear Unit, exact erf form.
    Gelu,
    /// Leaky ReLU with negative slope 0.5.
    LeakyRelu,
    /// Rectified linear unit.
    Relu,
    /// Hyperbolic tangent.
    Tanh,
    /// Exponential linear unit with alpha = 1.
    Elu,
    /// Softplus `ln(1 + e^x)` with an overflow guard.
    Softplus,
}

impl Activation {
    /// Applies the activation to a single value.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Gelu => gelu(x),
            Activation::LeakyRelu => leaky_relu(x),
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Elu => elu(x),
            Activation::Softplus => softplus(x),
        }
    }

    /// Applies the activation to a buffer in place.
    #[inline]
    pub fn apply_slice(self, values: &mut [f32]) {
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }
}

/// Exact GELU: `x * Phi(x) = x * 0.5 * (1 + erf(x / sqrt(2)))`.
#[inline]
pub fn gelu(x: f32) -> f32 {
    let xf = x as f64;
    (xf * 0.5 * (1.0 + erf(xf / std::f64::consts::SQRT_2))) as f32
}

#[inline]
fn leaky_relu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        LEAKY_SLOPE * x
    }
}

#[inline]
fn elu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        x.exp() - 1.0
    }
}

#[inline]
fn softplus(x: f32) -> f32 {
    if x > SOFTPLUS_THRESHOLD {
        x
    } else {
        x.exp().ln_1p()
    }
}
