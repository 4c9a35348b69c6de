//! Observations, labeled training sequences, and the decode-time value index.

use std::collections::{BTreeMap, HashMap};

use ductus_core::{DuctusError, Result};

use crate::schema::{FeatureKind, Schema};

/// A single feature measurement.
///
/// A discrete value is a bucket index at training time and a raw provider
/// value (translated through a [`ValueIndex`]) at decode time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureValue {
    /// Real-valued measurement.
    Continuous(f64),
    /// Discrete bucket index or raw discrete value.
    Discrete(usize),
}

/// One item in a sequence: a mapping from feature name to value.
///
/// Features not named by the model schema are ignored during resolution;
/// schema features missing from an observation are an input error.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    values: BTreeMap<String, FeatureValue>,
}

impl Observation {
    /// Create an empty observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Insert or replace a feature value.
    pub fn set(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.values.insert(name.into(), value);
    }

    /// Look up a feature value by name.
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.values.get(name).copied()
    }

    /// Number of feature values carried.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the observation carries no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, FeatureValue)> for Observation {
    fn from_iter<T: IntoIterator<Item = (String, FeatureValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// One fully labeled trajectory: an observation sequence and the true label
/// of every position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingSequence {
    observations: Vec<Observation>,
    labels: Vec<String>,
}

impl TrainingSequence {
    /// Pair an observation sequence with its label sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequences are empty or their lengths differ.
    pub fn new(observations: Vec<Observation>, labels: Vec<String>) -> Result<Self> {
        if observations.is_empty() {
            return Err(DuctusError::InvalidInput(
                "training sequence must not be empty".into(),
            ));
        }
        if observations.len() != labels.len() {
            return Err(DuctusError::InvalidInput(format!(
                "observation/label length mismatch: {} observations, {} labels",
                observations.len(),
                labels.len()
            )));
        }
        Ok(Self {
            observations,
            labels,
        })
    }

    /// Sequence length.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Always false: emptiness is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The observation sequence.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The label sequence.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Per-feature translation from raw discrete values to bucket indices,
/// supplied by the feature provider and injected into decoding.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueIndex {
    map: HashMap<String, HashMap<usize, usize>>,
}

impl ValueIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the bucket index for one raw value of a discrete feature.
    pub fn insert(&mut self, feature: impl Into<String>, raw: usize, bucket: usize) {
        self.map.entry(feature.into()).or_default().insert(raw, bucket);
    }

    /// Identity index over every discrete feature of a schema: raw value `v`
    /// maps to bucket `v` for `v` in `0..n`. This is what providers that
    /// emit pre-binned values use.
    pub fn identity(schema: &Schema) -> Self {
        let mut index = Self::new();
        for (name, kind) in schema.features() {
            if let FeatureKind::Discrete(n) = kind {
                for v in 0..*n {
                    index.insert(name.clone(), v, v);
                }
            }
        }
        index
    }

    /// Bucket index for a raw value of a feature, if registered.
    pub fn bucket(&self, feature: &str, raw: usize) -> Option<usize> {
        self.map.get(feature)?.get(&raw).copied()
    }
}

/// An observation value resolved against a schema: feature kinds verified
/// and discrete values translated to in-range bucket indices.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Resolved {
    Real(f64),
    Bucket(usize),
}

/// Resolve one observation into values aligned with the schema's feature
/// order.
///
/// With a [`ValueIndex`], discrete values are treated as raw provider values
/// and translated (unknown raw values are a lookup error). Without one,
/// discrete values are taken as bucket indices directly.
pub(crate) fn resolve(
    schema: &Schema,
    index: Option<&ValueIndex>,
    obs: &Observation,
) -> Result<Vec<Resolved>> {
    let mut out = Vec::with_capacity(schema.n_features());
    for (name, kind) in schema.features() {
        let value = obs.get(name).ok_or_else(|| {
            DuctusError::InvalidInput(format!("observation is missing feature '{name}'"))
        })?;
        let resolved = match (kind, value) {
            (FeatureKind::Continuous, FeatureValue::Continuous(x)) => Resolved::Real(x),
            (FeatureKind::Discrete(n), FeatureValue::Discrete(raw)) => {
                let bucket = match index {
                    Some(index) => index.bucket(name, raw).ok_or_else(|| {
                        DuctusError::Lookup(format!(
                            "no index entry for value {raw} of feature '{name}'"
                        ))
                    })?,
                    None => raw,
                };
                if bucket >= *n {
                    return Err(DuctusError::InvalidInput(format!(
                        "bucket {bucket} out of range for feature '{name}' ({n} buckets)"
                    )));
                }
                Resolved::Bucket(bucket)
            }
            (FeatureKind::Continuous, FeatureValue::Discrete(_)) => {
                return Err(DuctusError::InvalidInput(format!(
                    "feature '{name}' expects a continuous value"
                )));
            }
            (FeatureKind::Discrete(_), FeatureValue::Continuous(_)) => {
                return Err(DuctusError::InvalidInput(format!(
                    "feature '{name}' expects a discrete value"
                )));
            }
        };
        out.push(resolved);
    }
    Ok(out)
}
