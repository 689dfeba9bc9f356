//! Serialized policy artifact.

use std::collections::BTreeMap;

use reservoir_core::Reservoir;
use reservoir_models::RoughHestonParams;
use serde::{Deserialize, Serialize};

use crate::payoffs::PayoffKind;
use crate::policy::PolicyError;

fn default_version() -> u32 {
    1
}

/// Frozen output of an offline policy fit.
///
/// Everything the engine needs to replay the exercise policy travels in
/// one document: the reservoir, the per-date regression coefficients,
/// the model the paths are expected to come from, and the payoff
/// reference. Coefficient vectors have length `hidden_size + 1`; the
/// trailing entry multiplies the constant column the engine appends to
/// the basis.
///
/// The coefficient map is sparse by design: dates the fit skipped are
/// simply absent, and the engine holds (does not exercise) on them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    /// Schema version, for forward compatibility of stored artifacts.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Frozen basis-function extractor.
    pub reservoir: Reservoir,
    /// Regression coefficients keyed by exercise date (1..nb_dates-1).
    pub coefficients: BTreeMap<usize, Vec<f32>>,
    /// Model the policy was fitted against.
    pub model: RoughHestonParams,
    /// Payoff reference from the closed registry.
    pub payoff: PayoffKind,
    /// Whether the immediate payoff is appended to the input state.
    pub use_payoff_as_input: bool,
    /// Whether barrier levels are appended to the input state.
    pub use_barrier_as_input: bool,
    /// Barrier levels fed as input features; empty unless
    /// `use_barrier_as_input`.
    #[serde(default)]
    pub barrier_values: Vec<f32>,
}

impl PolicyArtifact {
    /// Parses an artifact from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the artifact to a JSON document.
    pub fn to_json(&self) -> Result<String, PolicyError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reservoir_core::{Activation, DenseLayer};

    fn tiny_artifact() -> PolicyArtifact {
        let layer = DenseLayer::new(vec![vec![0.5, -0.25]; 4], vec![0.0; 4]).unwrap();
        let reservoir = Reservoir::new(vec![layer], Activation::Gelu, vec![1.0], 0.0).unwrap();
        let mut coefficients = BTreeMap::new();
        coefficients.insert(1usize, vec![0.1; 5]);
        PolicyArtifact {
            version: 1,
            reservoir,
            coefficients,
            model: RoughHestonParams::default(),
            payoff: PayoffKind::UpAndOutCall {
                strike: 100.0,
                barrier: 120.0,
            },
            use_payoff_as_input: true,
            use_barrier_as_input: false,
            barrier_values: Vec::new(),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let artifact = tiny_artifact();
        let json = artifact.to_json().unwrap();
        let back = PolicyArtifact::from_json(&json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn test_version_defaults_when_absent() {
        let artifact = tiny_artifact();
        let json = artifact.to_json().unwrap();
        let stripped = json.replacen("\"version\":1,", "", 1);
        let back = PolicyArtifact::from_json(&stripped).unwrap();
        assert_eq!(back.version, 1);
    }

    #[test]
    fn test_coefficient_map_order_is_stable() {
        let mut artifact = tiny_artifact();
        artifact.coefficients.insert(5, vec![0.2; 5]);
        artifact.coefficients.insert(3, vec![0.3; 5]);
        let dates: Vec<usize> = artifact.coefficients.keys().copied().collect();
        assert_eq!(dates, vec![1, 3, 5]);
    }
}
