//! Model layout fixed at construction: hidden states and feature kinds.

use ductus_core::{DuctusError, Result};

/// Whether a feature is real-valued or ranges over a fixed set of
/// integer buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureKind {
    /// Real-valued feature, modeled per state by a Gaussian.
    Continuous,
    /// Discrete feature with legal bucket values `0..n`, modeled per state
    /// by a Laplace-smoothed probability vector.
    Discrete(usize),
}

/// The fixed layout of an HMM: an ordered set of hidden states and an
/// ordered list of named features.
///
/// Construction order is the stable iteration order used by estimation and
/// decoding, including Viterbi tie-breaking — callers that rely on exact
/// tie resolution must fix the state order deliberately.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    states: Vec<String>,
    features: Vec<(String, FeatureKind)>,
}

impl Schema {
    /// Create a schema after validating states and features.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `states` or `features` is empty
    /// - A state label or feature name is duplicated
    /// - A discrete feature declares zero legal values
    pub fn new(states: Vec<String>, features: Vec<(String, FeatureKind)>) -> Result<Self> {
        if states.is_empty() {
            return Err(DuctusError::InvalidInput(
                "schema requires at least one state".into(),
            ));
        }
        if features.is_empty() {
            return Err(DuctusError::InvalidInput(
                "schema requires at least one feature".into(),
            ));
        }
        for (i, s) in states.iter().enumerate() {
            if states[..i].contains(s) {
                return Err(DuctusError::InvalidInput(format!(
                    "duplicate state label '{s}'"
                )));
            }
        }
        for (i, (name, kind)) in features.iter().enumerate() {
            if features[..i].iter().any(|(n, _)| n == name) {
                return Err(DuctusError::InvalidInput(format!(
                    "duplicate feature name '{name}'"
                )));
            }
            if let FeatureKind::Discrete(0) = kind {
                return Err(DuctusError::InvalidInput(format!(
                    "discrete feature '{name}' must have at least one bucket"
                )));
            }
        }
        Ok(Self { states, features })
    }

    /// Number of hidden states.
    pub fn n_states(&self) -> usize {
        self.states.len()
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// The ordered state labels.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// The ordered feature names and kinds.
    pub fn features(&self) -> &[(String, FeatureKind)] {
        &self.features
    }

    /// Position of a state label in the stable ordering.
    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s == label)
    }

    /// Kind of a feature by name.
    pub fn feature_kind(&self, name: &str) -> Option<FeatureKind> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, k)| *k)
    }
}
