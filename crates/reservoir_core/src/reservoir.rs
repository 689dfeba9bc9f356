//! Frozen random-feature network ("reservoir").
//!
//! A reservoir is an ordered list of dense layers with fixed, randomly
//! generated weights, followed by a nonlinear activation after each layer.
//! It is a plain value object: weights are immutable after construction
//! and there is no gradient machinery. The offline trainer that fits the
//! per-date regression coefficients owns any trainable counterpart.
//!
//! # Serialization
//!
//! The serde representation carries the ordered `(weights, bias)` list,
//! the activation name, the factor tuple and the dropout value, and
//! round-trips without loss. Dropout is a training-time artifact; the
//! forward pass here is always the identity in that respect.

use crate::error::CoreError;
use crate::math::activations::Activation;
use serde::{Deserialize, Serialize};

/// One dense layer: `out = x @ W^T + b`.
///
/// Weights are stored row-per-output-unit, i.e. shape `(out_dim, in_dim)`,
/// matching the serialized artifact layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl DenseLayer {
    /// Creates a layer, validating that every weight row has the same
    /// length and that the bias matches the output dimension.
    pub fn new(weights: Vec<Vec<f32>>, bias: Vec<f32>) -> Result<Self, CoreError> {
        if weights.is_empty() {
            return Err(CoreError::Config {
                name: "weights",
                reason: "layer must have at least one output unit".to_string(),
            });
        }
        let in_dim = weights[0].len();
        if in_dim == 0 {
            return Err(CoreError::Config {
                name: "weights",
                reason: "layer must have at least one input".to_string(),
            });
        }
        for row in &weights {
            if row.len() != in_dim {
                return Err(CoreError::Shape {
                    context: "layer weight row",
                    expected: in_dim,
                    actual: row.len(),
                });
            }
        }
        if bias.len() != weights.len() {
            return Err(CoreError::Shape {
                context: "layer bias",
                expected: weights.len(),
                actual: bias.len(),
            });
        }
        Ok(Self { weights, bias })
    }

    /// Input dimension of the layer.
    #[inline]
    pub fn in_dim(&self) -> usize {
        self.weights[0].len()
    }

    /// Output dimension of the layer.
    #[inline]
    pub fn out_dim(&self) -> usize {
        self.weights.len()
    }

    /// Computes `activation(x @ W^T + b)` for a batch stored row-major.
    fn forward_into(&self, input: &[f32], batch: usize, activation: Activation) -> Vec<f32> {
        let in_dim = self.in_dim();
        let out_dim = self.out_dim();
        let mut output = vec![0.0f32; batch * out_dim];

        for b in 0..batch {
            let row_in = &input[b * in_dim..(b + 1) * in_dim];
            let row_out = &mut output[b * out_dim..(b + 1) * out_dim];
            for (o, (w_row, &bias)) in self.weights.iter().zip(&self.bias).enumerate() {
                let mut acc = bias;
                for (x, w) in row_in.iter().zip(w_row) {
                    acc += x * w;
                }
                row_out[o] = acc;
            }
        }
        activation.apply_slice(&mut output);
        output
    }
}

/// Frozen random projection + activation: the basis-function extractor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    layers: Vec<DenseLayer>,
    activation: Activation,
    factors: Vec<f32>,
    dropout: f32,
}

impl Reservoir {
    /// Creates a reservoir from its layers.
    ///
    /// # Errors
    ///
    /// Fails if there are no layers, the factor tuple is empty, or
    /// consecutive layer dimensions do not chain.
    pub fn new(
        layers: Vec<DenseLayer>,
        activation: Activation,
        factors: Vec<f32>,
        dropout: f32,
    ) -> Result<Self, CoreError> {
        if layers.is_empty() {
            return Err(CoreError::Config {
                name: "layers",
                reason: "reservoir must have at least one layer".to_string(),
            });
        }
        if factors.is_empty() {
            return Err(CoreError::Config {
                name: "factors",
                reason: "factor tuple must not be empty".to_string(),
            });
        }
        for pair in layers.windows(2) {
            if pair[1].in_dim() != pair[0].out_dim() {
                return Err(CoreError::Shape {
                    context: "layer chaining",
                    expected: pair[0].out_dim(),
                    actual: pair[1].in_dim(),
                });
            }
        }
        Ok(Self {
            layers,
            activation,
            factors,
            dropout,
        })
    }

    /// Dimension of the state vector the reservoir expects.
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    /// Number of basis functions produced (output dimension of the last
    /// layer). The regression coefficient vectors have length
    /// `hidden_size() + 1` to account for the constant bias column the
    /// policy engine appends.
    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.layers.last().expect("validated non-empty").out_dim()
    }

    /// Activation applied after each layer.
    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Input scale factor (first element of the factor tuple).
    #[inline]
    pub fn input_factor(&self) -> f32 {
        self.factors[0]
    }

    /// Dropout probability carried from training. Inference ignores it.
    #[inline]
    pub fn dropout(&self) -> f32 {
        self.dropout
    }

    /// Forward pass for a row-major batch of state vectors.
    ///
    /// `state` has `batch * state_dim` entries; the result has
    /// `batch * hidden_size()` entries, also row-major.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Shape`] when `state_dim` differs from
    /// [`input_dim`](Self::input_dim) or the buffer length is inconsistent
    /// with `batch * state_dim`.
    pub fn forward(&self, state: &[f32], batch: usize, state_dim: usize) -> Result<Vec<f32>, CoreError> {
        if state_dim != self.input_dim() {
            return Err(CoreError::Shape {
                context: "reservoir input",
                expected: self.input_dim(),
                actual: state_dim,
            });
        }
        if state.len() != batch * state_dim {
            return Err(CoreError::Shape {
                context: "reservoir batch buffer",
                expected: batch * state_dim,
                actual: state.len(),
            });
        }

        // Scale input by the first factor, then run each layer in order.
        let factor = self.factors[0];
        let mut current: Vec<f32> = state.iter().map(|&x| x * factor).collect();
        for layer in &self.layers {
            current = layer.forward_into(&current, batch, self.activation);
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity_layer(dim: usize) -> DenseLayer {
        let weights = (0..dim)
            .map(|i| (0..dim).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        DenseLayer::new(weights, vec![0.0; dim]).unwrap()
    }

    #[test]
    fn test_layer_rejects_ragged_rows() {
        let result = DenseLayer::new(vec![vec![1.0, 2.0], vec![1.0]], vec![0.0, 0.0]);
        assert!(matches!(result, Err(CoreError::Shape { .. })));
    }

    #[test]
    fn test_layer_rejects_bias_mismatch() {
        let result = DenseLayer::new(vec![vec![1.0, 2.0]], vec![0.0, 0.0]);
        assert!(matches!(result, Err(CoreError::Shape { .. })));
    }

    #[test]
    fn test_reservoir_rejects_unchained_layers() {
        let l1 = DenseLayer::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0.0, 0.0]).unwrap();
        let l2 = DenseLayer::new(vec![vec![1.0, 2.0, 3.0]], vec![0.0]).unwrap();
        let result = Reservoir::new(vec![l1, l2], Activation::Relu, vec![1.0], 0.0);
        assert!(matches!(result, Err(CoreError::Shape { .. })));
    }

    #[test]
    fn test_forward_identity_relu() {
        let reservoir =
            Reservoir::new(vec![identity_layer(3)], Activation::Relu, vec![1.0], 0.0).unwrap();
        let state = [1.0f32, -2.0, 3.0, -1.0, 0.5, 0.0];
        let out = reservoir.forward(&state, 2, 3).unwrap();
        assert_eq!(out, vec![1.0, 0.0, 3.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_forward_applies_input_factor() {
        let reservoir =
            Reservoir::new(vec![identity_layer(2)], Activation::Relu, vec![0.5], 0.0).unwrap();
        let out = reservoir.forward(&[4.0, 8.0], 1, 2).unwrap();
        assert_eq!(out, vec![2.0, 4.0]);
    }

    #[test]
    fn test_forward_linear_algebra() {
        // W = [[1, 2], [3, 4]], b = [0.5, -0.5], tanh activation.
        let layer =
            DenseLayer::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0.5, -0.5]).unwrap();
        let reservoir = Reservoir::new(vec![layer], Activation::Tanh, vec![1.0], 0.0).unwrap();
        let out = reservoir.forward(&[1.0, 1.0], 1, 2).unwrap();
        assert_relative_eq!(out[0], 3.5f32.tanh(), epsilon = 1e-6);
        assert_relative_eq!(out[1], 6.5f32.tanh(), epsilon = 1e-6);
    }

    #[test]
    fn test_forward_rejects_wrong_state_dim() {
        let reservoir =
            Reservoir::new(vec![identity_layer(3)], Activation::Gelu, vec![1.0], 0.0).unwrap();
        let result = reservoir.forward(&[1.0, 2.0], 1, 2);
        assert!(matches!(result, Err(CoreError::Shape { .. })));
    }

    #[test]
    fn test_hidden_size_is_last_layer() {
        let l1 = DenseLayer::new(vec![vec![1.0, 2.0]; 5], vec![0.0; 5]).unwrap();
        let l2 = DenseLayer::new(vec![vec![0.1; 5]; 7], vec![0.0; 7]).unwrap();
        let reservoir = Reservoir::new(vec![l1, l2], Activation::Gelu, vec![1.0], 0.1).unwrap();
        assert_eq!(reservoir.input_dim(), 2);
        assert_eq!(reservoir.hidden_size(), 7);
    }

    #[test]
    fn test_serde_round_trip() {
        let layer =
            DenseLayer::new(vec![vec![1.5, -2.25], vec![0.125, 4.0]], vec![0.5, -0.5]).unwrap();
        let reservoir =
            Reservoir::new(vec![layer], Activation::Gelu, vec![0.8, 1.2], 0.1).unwrap();

        let json = serde_json::to_string(&reservoir).unwrap();
        let back: Reservoir = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reservoir);

        // The forward pass of the round-tripped reservoir is bit-identical.
        let out_a = reservoir.forward(&[1.0, 2.0], 1, 2).unwrap();
        let out_b = back.forward(&[1.0, 2.0], 1, 2).unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_dropout_is_inert_at_inference() {
        let layer = DenseLayer::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]], vec![0.0, 0.0]).unwrap();
        let with_dropout =
            Reservoir::new(vec![layer.clone()], Activation::Relu, vec![1.0], 0.9).unwrap();
        let without = Reservoir::new(vec![layer], Activation::Relu, vec![1.0], 0.0).unwrap();
        let state = [3.0f32, 4.0];
        assert_eq!(
            with_dropout.forward(&state, 1, 2).unwrap(),
            without.forward(&state, 1, 2).unwrap()
        );
    }
}
