//! Fitted model parameters and emission-probability evaluation.

use ductus_core::{DuctusError, LogProb, Result};

use crate::observation::{resolve, Observation, Resolved, TrainingSequence, ValueIndex};
use crate::schema::{FeatureKind, Schema};
use crate::train::{self, TrainReport};

const LN_2PI: f64 = 1.8378770664093453;

/// Per-(state, feature) emission model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Emission {
    /// Gaussian density for a continuous feature.
    Gaussian {
        /// Sample mean of the training values under the state.
        mean: f64,
        /// Population standard deviation (always > 0 in a valid model).
        sigma: f64,
    },
    /// Smoothed probability vector over the buckets of a discrete feature.
    Categorical(Vec<f64>),
}

impl Emission {
    /// Log probability (density for Gaussians) of one resolved value.
    ///
    /// Kind mismatches cannot occur for values produced by schema
    /// resolution; they evaluate to `-inf`.
    fn log_prob(&self, value: Resolved) -> f64 {
        match (self, value) {
            (Emission::Gaussian { mean, sigma }, Resolved::Real(x)) => {
                let z = (x - mean) / sigma;
                -0.5 * z * z - sigma.ln() - 0.5 * LN_2PI
            }
            (Emission::Categorical(p), Resolved::Bucket(b)) => p[b].ln(),
            _ => f64::NEG_INFINITY,
        }
    }
}

/// An immutable fitted HMM: priors, transition matrix, and emission table.
///
/// Produced by [`HmmModel::fit`] from labeled training data or by
/// [`HmmModel::from_parts`] from hand-specified tables. All parameters are
/// read-only after construction, so a fitted model can be shared freely
/// across threads for concurrent decoding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HmmModel {
    schema: Schema,
    /// Prior probability per state (schema order).
    priors: Vec<f64>,
    /// Transition matrix, stored row-major as `n_states * n_states`.
    transitions: Vec<f64>,
    /// Emission table, stored row-major as `n_states * n_features`.
    emissions: Vec<Emission>,
}

impl HmmModel {
    /// Estimate a model from a batch of fully labeled training sequences.
    ///
    /// This is a pure function of its inputs: the same schema and data
    /// always produce identical parameters. Alongside the model it returns
    /// a [`TrainReport`] naming degenerate-but-legal outcomes (zero priors,
    /// uniform transition fallbacks).
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is empty, a label is not a schema
    /// state, an observation does not conform to the schema, or a
    /// continuous feature is degenerate for some state.
    pub fn fit(schema: Schema, data: &[TrainingSequence]) -> Result<(Self, TrainReport)> {
        let (priors, zero_prior_states) = train::estimate_priors(&schema, data)?;
        let (transitions, uniform_transition_states) =
            train::estimate_transitions(&schema, data)?;
        let emissions = train::estimate_emissions(&schema, data)?;
        let report = TrainReport {
            zero_prior_states,
            uniform_transition_states,
        };
        Ok((
            Self {
                schema,
                priors,
                transitions,
                emissions,
            },
            report,
        ))
    }

    /// Build a model from explicit parameter tables, validating shapes and
    /// probability constraints (each distribution must sum to 1 within
    /// 1e-6).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` on dimension or normalization violations and
    /// `Config` on a non-positive or non-finite Gaussian sigma.
    pub fn from_parts(
        schema: Schema,
        priors: Vec<f64>,
        transitions: Vec<f64>,
        emissions: Vec<Emission>,
    ) -> Result<Self> {
        let n = schema.n_states();
        let nf = schema.n_features();
        if priors.len() != n {
            return Err(DuctusError::InvalidInput(format!(
                "priors length {} != n_states {n}",
                priors.len()
            )));
        }
        if transitions.len() != n * n {
            return Err(DuctusError::InvalidInput(format!(
                "transitions length {} != n_states^2 {}",
                transitions.len(),
                n * n
            )));
        }
        if emissions.len() != n * nf {
            return Err(DuctusError::InvalidInput(format!(
                "emissions length {} != n_states*n_features {}",
                emissions.len(),
                n * nf
            )));
        }

        let tol = 1e-6;
        let prior_sum: f64 = priors.iter().sum();
        if (prior_sum - 1.0).abs() > tol {
            return Err(DuctusError::InvalidInput(format!(
                "priors sum to {prior_sum}, expected ~1.0"
            )));
        }
        for i in 0..n {
            let row_sum: f64 = transitions[i * n..(i + 1) * n].iter().sum();
            if (row_sum - 1.0).abs() > tol {
                return Err(DuctusError::InvalidInput(format!(
                    "transition row for state '{}' sums to {row_sum}, expected ~1.0",
                    schema.states()[i]
                )));
            }
        }
        for s in 0..n {
            for (f, (name, kind)) in schema.features().iter().enumerate() {
                match (&emissions[s * nf + f], kind) {
                    (Emission::Gaussian { sigma, .. }, FeatureKind::Continuous) => {
                        if !(*sigma > 0.0 && sigma.is_finite()) {
                            return Err(DuctusError::Config(format!(
                                "feature '{name}' has non-positive sigma under state '{}'",
                                schema.states()[s]
                            )));
                        }
                    }
                    (Emission::Categorical(p), FeatureKind::Discrete(k)) => {
                        if p.len() != *k {
                            return Err(DuctusError::InvalidInput(format!(
                                "emission vector for feature '{name}' has length {}, expected {k}",
                                p.len()
                            )));
                        }
                        let sum: f64 = p.iter().sum();
                        if (sum - 1.0).abs() > tol || p.iter().any(|&x| x < 0.0) {
                            return Err(DuctusError::InvalidInput(format!(
                                "emission vector for feature '{name}' under state '{}' is not a distribution",
                                schema.states()[s]
                            )));
                        }
                    }
                    _ => {
                        return Err(DuctusError::InvalidInput(format!(
                            "emission model for feature '{name}' does not match its kind"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            schema,
            priors,
            transitions,
            emissions,
        })
    }

    /// The schema the model was built with.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Prior vector in schema state order.
    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    /// Prior probability of a state.
    pub fn prior(&self, state: &str) -> Option<f64> {
        Some(self.priors[self.schema.state_index(state)?])
    }

    /// Transition probability from one state to another.
    pub fn transition(&self, from: &str, to: &str) -> Option<f64> {
        let n = self.schema.n_states();
        Some(self.transitions[self.schema.state_index(from)? * n + self.schema.state_index(to)?])
    }

    /// Emission model for a (state, feature) pair.
    pub fn emission(&self, state: &str, feature: &str) -> Option<&Emission> {
        let s = self.schema.state_index(state)?;
        let f = self
            .schema
            .features()
            .iter()
            .position(|(n, _)| n == feature)?;
        Some(&self.emissions[s * self.schema.n_features() + f])
    }

    pub(crate) fn prior_at(&self, state: usize) -> f64 {
        self.priors[state]
    }

    pub(crate) fn transition_at(&self, from: usize, to: usize) -> f64 {
        self.transitions[from * self.schema.n_states() + to]
    }

    /// Joint log emission probability of a resolved observation under a
    /// state: the sum of per-feature log probabilities (features are
    /// conditionally independent given the state).
    pub(crate) fn log_emission(&self, state: usize, resolved: &[Resolved]) -> f64 {
        let nf = self.schema.n_features();
        resolved
            .iter()
            .enumerate()
            .map(|(f, &v)| self.emissions[state * nf + f].log_prob(v))
            .sum()
    }

    /// P(observation | state) for a direct likelihood query.
    ///
    /// Discrete values are taken as bucket indices (no value index is
    /// involved). With continuous features in play the result is a density
    /// and may exceed 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the state is unknown or the observation does not
    /// conform to the schema.
    pub fn emission_prob(&self, state: &str, obs: &Observation) -> Result<f64> {
        let s = self.schema.state_index(state).ok_or_else(|| {
            DuctusError::InvalidInput(format!("'{state}' is not a schema state"))
        })?;
        let resolved = resolve(&self.schema, None, obs)?;
        Ok(self.log_emission(s, &resolved).exp())
    }
}

/// Stateful train-then-decode engine: a schema plus, once trained, a fitted
/// [`HmmModel`].
///
/// Training takes `&mut self` and decoding `&self`, so the single-writer /
/// many-reader contract is enforced by the borrow checker. Retraining
/// re-estimates every parameter from scratch.
#[derive(Debug, Clone)]
pub struct Hmm {
    schema: Schema,
    model: Option<HmmModel>,
}

impl Hmm {
    /// Create an untrained engine over a fixed schema.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            model: None,
        }
    }

    /// The engine's schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether [`train`](Self::train) has completed successfully.
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Estimate all parameters from a batch of labeled sequences,
    /// replacing any previously fitted model.
    ///
    /// # Errors
    ///
    /// See [`HmmModel::fit`]. On error the previous model (if any) is left
    /// in place.
    pub fn train(&mut self, data: &[TrainingSequence]) -> Result<TrainReport> {
        let (model, report) = HmmModel::fit(self.schema.clone(), data)?;
        self.model = Some(model);
        Ok(report)
    }

    /// The fitted model.
    ///
    /// # Errors
    ///
    /// Returns `NotTrained` if no training run has completed.
    pub fn model(&self) -> Result<&HmmModel> {
        self.model
            .as_ref()
            .ok_or_else(|| DuctusError::NotTrained("call train() before decoding".into()))
    }

    /// Decode the most probable label sequence for an observation sequence.
    /// See [`HmmModel::decode`].
    ///
    /// # Errors
    ///
    /// Returns `NotTrained` before training, plus any decode error.
    pub fn decode(
        &self,
        index: &ValueIndex,
        observations: &[Observation],
    ) -> Result<(Vec<String>, LogProb)> {
        self.model()?.decode(index, observations)
    }

    /// P(observation | state) against the fitted model.
    ///
    /// # Errors
    ///
    /// Returns `NotTrained` before training, plus any evaluation error.
    pub fn emission_prob(&self, state: &str, obs: &Observation) -> Result<f64> {
        self.model()?.emission_prob(state, obs)
    }
}
