//! Maximum-likelihood parameter estimation from fully labeled sequences.
//!
//! Priors are sequence-initial frequencies, transitions are row-normalized
//! bigram counts, and emissions are per-(state, feature) Gaussians
//! (continuous) or Laplace-smoothed probability vectors (discrete).
//! Degenerate-but-legal outcomes (a state with no prior mass, a state with
//! no outgoing transition evidence) are reported in [`TrainReport`] rather
//! than silently producing zeros or NaNs.

use ductus_core::{DuctusError, Result};

use crate::model::Emission;
use crate::observation::{resolve, Resolved, TrainingSequence};
use crate::schema::{FeatureKind, Schema};

/// Observable degeneracies of a completed training run.
///
/// Neither condition is an error: a zero prior merely makes the state
/// unreachable at sequence start, and a uniform transition row is the
/// fallback for a state never seen in a non-terminal position. Callers can
/// use the report to detect sparse training data.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainReport {
    /// States that never appear as the first label of any sequence.
    pub zero_prior_states: Vec<String>,
    /// States whose outgoing transition row fell back to uniform.
    pub uniform_transition_states: Vec<String>,
}

impl TrainReport {
    /// Whether training observed any degeneracy worth surfacing.
    pub fn has_warnings(&self) -> bool {
        !self.zero_prior_states.is_empty() || !self.uniform_transition_states.is_empty()
    }
}

fn state_index(schema: &Schema, label: &str) -> Result<usize> {
    schema.state_index(label).ok_or_else(|| {
        DuctusError::InvalidInput(format!("label '{label}' is not a schema state"))
    })
}

/// Estimate prior probabilities as the empirical frequency of each state
/// appearing first in a training sequence.
///
/// Returns the prior vector (schema state order) and the states with zero
/// prior mass.
///
/// # Errors
///
/// Returns an error if the batch is empty or a label is not a schema state.
pub fn estimate_priors(
    schema: &Schema,
    data: &[TrainingSequence],
) -> Result<(Vec<f64>, Vec<String>)> {
    if data.is_empty() {
        return Err(DuctusError::InvalidInput(
            "training batch must not be empty".into(),
        ));
    }
    let mut counts = vec![0usize; schema.n_states()];
    for seq in data {
        counts[state_index(schema, &seq.labels()[0])?] += 1;
    }
    let total = data.len() as f64;
    let priors: Vec<f64> = counts.iter().map(|&c| c as f64 / total).collect();
    let zero: Vec<String> = schema
        .states()
        .iter()
        .zip(&counts)
        .filter(|(_, &c)| c == 0)
        .map(|(s, _)| s.clone())
        .collect();
    Ok((priors, zero))
}

/// Estimate transition probabilities as row-normalized bigram counts over
/// all consecutive label pairs. Length-1 sequences contribute no evidence.
///
/// A source state with no outgoing evidence would divide by zero; it gets a
/// uniform row instead and is named in the returned fallback list.
///
/// Returns the flat row-major transition matrix and the fallback states.
///
/// # Errors
///
/// Returns an error if the batch is empty or a label is not a schema state.
pub fn estimate_transitions(
    schema: &Schema,
    data: &[TrainingSequence],
) -> Result<(Vec<f64>, Vec<String>)> {
    if data.is_empty() {
        return Err(DuctusError::InvalidInput(
            "training batch must not be empty".into(),
        ));
    }
    let n = schema.n_states();
    let mut counts = vec![0usize; n * n];
    for seq in data {
        for pair in seq.labels().windows(2) {
            let from = state_index(schema, &pair[0])?;
            let to = state_index(schema, &pair[1])?;
            counts[from * n + to] += 1;
        }
    }

    let mut transitions = vec![0.0; n * n];
    let mut fallback = Vec::new();
    for i in 0..n {
        let row = &counts[i * n..(i + 1) * n];
        let total: usize = row.iter().sum();
        if total == 0 {
            for j in 0..n {
                transitions[i * n + j] = 1.0 / n as f64;
            }
            fallback.push(schema.states()[i].clone());
        } else {
            for j in 0..n {
                transitions[i * n + j] = row[j] as f64 / total as f64;
            }
        }
    }
    Ok((transitions, fallback))
}

/// Estimate the per-(state, feature) emission models.
///
/// Continuous features get a Gaussian with the population mean and standard
/// deviation (dividing by `n`) of the values observed under the state.
/// Discrete features get a count vector initialized to 1 (add-one
/// smoothing), incremented per observed bucket, and normalized by
/// `n + num_vals`.
///
/// Returns the flat emission table (`state * n_features + feature`).
///
/// # Errors
///
/// Returns an error if the batch is empty, an observation does not conform
/// to the schema, or a continuous feature is degenerate for some state
/// (no observations, or zero standard deviation).
pub fn estimate_emissions(schema: &Schema, data: &[TrainingSequence]) -> Result<Vec<Emission>> {
    if data.is_empty() {
        return Err(DuctusError::InvalidInput(
            "training batch must not be empty".into(),
        ));
    }
    let n_states = schema.n_states();
    let n_features = schema.n_features();

    // Group observed values by (state, feature).
    let mut grouped: Vec<Vec<Resolved>> = vec![Vec::new(); n_states * n_features];
    for seq in data {
        for (obs, label) in seq.observations().iter().zip(seq.labels()) {
            let state = state_index(schema, label)?;
            let resolved = resolve(schema, None, obs)?;
            for (f, value) in resolved.into_iter().enumerate() {
                grouped[state * n_features + f].push(value);
            }
        }
    }

    #[cfg(feature = "parallel")]
    let emissions = {
        use rayon::prelude::*;
        let per_state: Vec<Vec<Emission>> = (0..n_states)
            .into_par_iter()
            .map(|s| {
                (0..n_features)
                    .map(|f| emission_cell(schema, s, f, &grouped[s * n_features + f]))
                    .collect::<Result<Vec<Emission>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        per_state.into_iter().flatten().collect()
    };
    #[cfg(not(feature = "parallel"))]
    let emissions = {
        let mut emissions = Vec::with_capacity(n_states * n_features);
        for s in 0..n_states {
            for f in 0..n_features {
                emissions.push(emission_cell(schema, s, f, &grouped[s * n_features + f])?);
            }
        }
        emissions
    };

    Ok(emissions)
}

fn emission_cell(
    schema: &Schema,
    state: usize,
    feature: usize,
    values: &[Resolved],
) -> Result<Emission> {
    let (name, kind) = &schema.features()[feature];
    match kind {
        FeatureKind::Continuous => {
            let xs: Vec<f64> = values
                .iter()
                .filter_map(|v| match v {
                    Resolved::Real(x) => Some(*x),
                    Resolved::Bucket(_) => None,
                })
                .collect();
            if xs.is_empty() {
                return Err(DuctusError::Config(format!(
                    "state '{}' has no observations for continuous feature '{name}'",
                    schema.states()[state]
                )));
            }
            let n = xs.len() as f64;
            let mean = xs.iter().sum::<f64>() / n;
            let sigma = (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
            if sigma == 0.0 {
                return Err(DuctusError::Config(format!(
                    "feature '{name}' has zero variance under state '{}'",
                    schema.states()[state]
                )));
            }
            Ok(Emission::Gaussian { mean, sigma })
        }
        FeatureKind::Discrete(k) => {
            let mut counts = vec![1.0; *k];
            let mut observed = 0usize;
            for v in values {
                if let Resolved::Bucket(b) = v {
                    counts[*b] += 1.0;
                    observed += 1;
                }
            }
            let denom = (observed + k) as f64;
            for c in &mut counts {
                *c /= denom;
            }
            Ok(Emission::Categorical(counts))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HmmModel;
    use crate::observation::{FeatureValue, Observation};

    fn discrete_schema() -> Schema {
        Schema::new(
            vec!["text".into(), "drawing".into()],
            vec![("length".into(), FeatureKind::Discrete(2))],
        )
        .unwrap()
    }

    fn obs_d(bucket: usize) -> Observation {
        Observation::new().with("length", FeatureValue::Discrete(bucket))
    }

    fn obs_c(x: f64) -> Observation {
        Observation::new().with("speed", FeatureValue::Continuous(x))
    }

    fn seq(buckets: &[usize], labels: &[&str]) -> TrainingSequence {
        TrainingSequence::new(
            buckets.iter().map(|&b| obs_d(b)).collect(),
            labels.iter().map(|&l| l.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn priors_are_initial_frequencies() {
        let schema = discrete_schema();
        let data = vec![
            seq(&[0, 1], &["text", "drawing"]),
            seq(&[0, 1], &["text", "drawing"]),
            seq(&[1, 0], &["drawing", "text"]),
            seq(&[0], &["text"]),
        ];
        let (priors, zero) = estimate_priors(&schema, &data).unwrap();
        assert_eq!(priors, vec![0.75, 0.25]);
        assert!(zero.is_empty());
    }

    #[test]
    fn zero_prior_state_is_reported_not_an_error() {
        let schema = discrete_schema();
        let data = vec![seq(&[0, 1], &["text", "drawing"])];
        let (priors, zero) = estimate_priors(&schema, &data).unwrap();
        assert_eq!(priors, vec![1.0, 0.0]);
        assert_eq!(zero, vec!["drawing".to_string()]);
    }

    #[test]
    fn unknown_label_rejected() {
        let schema = discrete_schema();
        let data = vec![seq(&[0], &["scribble"])];
        assert!(estimate_priors(&schema, &data).is_err());
    }

    #[test]
    fn transition_rows_normalize() {
        let schema = discrete_schema();
        // text->text x1, text->drawing x2, drawing->text x1, drawing->drawing x1
        let data = vec![
            seq(&[0, 0, 1, 1], &["text", "text", "drawing", "drawing"]),
            seq(&[0, 1, 0], &["text", "drawing", "text"]),
        ];
        let (t, fallback) = estimate_transitions(&schema, &data).unwrap();
        assert!(fallback.is_empty());
        assert!((t[0] - 1.0 / 3.0).abs() < 1e-12); // text->text
        assert!((t[1] - 2.0 / 3.0).abs() < 1e-12); // text->drawing
        assert!((t[2] - 0.5).abs() < 1e-12); // drawing->text
        assert!((t[3] - 0.5).abs() < 1e-12); // drawing->drawing
        assert!((t[0] + t[1] - 1.0).abs() < 1e-9);
        assert!((t[2] + t[3] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn length_one_sequences_contribute_no_transitions() {
        let schema = discrete_schema();
        let data = vec![seq(&[0], &["text"]), seq(&[1], &["drawing"])];
        let (t, fallback) = estimate_transitions(&schema, &data).unwrap();
        // No bigram evidence at all: every row is the uniform fallback.
        assert_eq!(t, vec![0.5, 0.5, 0.5, 0.5]);
        assert_eq!(
            fallback,
            vec!["text".to_string(), "drawing".to_string()]
        );
    }

    #[test]
    fn uniform_fallback_only_for_unseen_sources() {
        let schema = discrete_schema();
        // "drawing" only ever appears in terminal position.
        let data = vec![seq(&[0, 0, 1], &["text", "text", "drawing"])];
        let (t, fallback) = estimate_transitions(&schema, &data).unwrap();
        assert_eq!(fallback, vec!["drawing".to_string()]);
        assert!((t[0] - 0.5).abs() < 1e-12);
        assert!((t[1] - 0.5).abs() < 1e-12);
        assert_eq!(&t[2..], &[0.5, 0.5]);
        assert!(t.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn discrete_emissions_are_laplace_smoothed() {
        let schema = discrete_schema();
        // Under "text": buckets [0, 0, 0]; bucket 1 never observed.
        let data = vec![seq(&[0, 0, 0, 1], &["text", "text", "text", "drawing"])];
        let emissions = estimate_emissions(&schema, &data).unwrap();
        match &emissions[0] {
            Emission::Categorical(p) => {
                // counts [1+3, 1] / (3 + 2)
                assert!((p[0] - 4.0 / 5.0).abs() < 1e-12);
                assert!((p[1] - 1.0 / 5.0).abs() < 1e-12);
                assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
                // Smoothing lower bound: every entry >= 1/(n+k).
                assert!(p.iter().all(|&x| x >= 1.0 / 5.0 - 1e-12));
            }
            other => panic!("expected categorical emission, got {other:?}"),
        }
    }

    #[test]
    fn unobserved_discrete_cell_is_uniform() {
        let schema = Schema::new(
            vec!["text".into(), "drawing".into()],
            vec![("length".into(), FeatureKind::Discrete(4))],
        )
        .unwrap();
        // "drawing" never appears: its counts stay at the smoothing floor.
        let data = vec![seq(&[0, 3], &["text", "text"])];
        let emissions = estimate_emissions(&schema, &data).unwrap();
        match &emissions[1] {
            Emission::Categorical(p) => {
                assert_eq!(p, &vec![0.25; 4]);
            }
            other => panic!("expected categorical emission, got {other:?}"),
        }
    }

    #[test]
    fn gaussian_uses_population_formula() {
        let schema = Schema::new(
            vec!["text".into()],
            vec![("speed".into(), FeatureKind::Continuous)],
        )
        .unwrap();
        let data = vec![TrainingSequence::new(
            vec![obs_c(1.0), obs_c(2.0), obs_c(3.0), obs_c(4.0)],
            vec!["text".into(); 4],
        )
        .unwrap()];
        let emissions = estimate_emissions(&schema, &data).unwrap();
        match emissions[0] {
            Emission::Gaussian { mean, sigma } => {
                assert!((mean - 2.5).abs() < 1e-12);
                // Population variance: ((1.5^2)*2 + (0.5^2)*2) / 4 = 1.25
                assert!((sigma - 1.25_f64.sqrt()).abs() < 1e-12);
            }
            ref other => panic!("expected gaussian emission, got {other:?}"),
        }
    }

    #[test]
    fn missing_continuous_observations_is_config_error() {
        let schema = Schema::new(
            vec!["text".into(), "drawing".into()],
            vec![("speed".into(), FeatureKind::Continuous)],
        )
        .unwrap();
        // "drawing" has no observations at all.
        let data = vec![TrainingSequence::new(
            vec![obs_c(1.0), obs_c(2.0)],
            vec!["text".into(), "text".into()],
        )
        .unwrap()];
        let err = estimate_emissions(&schema, &data).unwrap_err();
        assert!(matches!(err, DuctusError::Config(_)));
    }

    #[test]
    fn zero_sigma_is_config_error() {
        let schema = Schema::new(
            vec!["text".into()],
            vec![("speed".into(), FeatureKind::Continuous)],
        )
        .unwrap();
        let data = vec![TrainingSequence::new(
            vec![obs_c(2.0), obs_c(2.0), obs_c(2.0)],
            vec!["text".into(); 3],
        )
        .unwrap()];
        let err = estimate_emissions(&schema, &data).unwrap_err();
        assert!(matches!(err, DuctusError::Config(_)));
    }

    #[test]
    fn fit_is_idempotent() {
        let schema = discrete_schema();
        let data = vec![
            seq(&[0, 0, 1, 1], &["text", "text", "drawing", "drawing"]),
            seq(&[1, 0], &["drawing", "text"]),
        ];
        let (m1, r1) = HmmModel::fit(schema.clone(), &data).unwrap();
        let (m2, r2) = HmmModel::fit(schema, &data).unwrap();
        assert_eq!(m1, m2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn fitted_distributions_sum_to_one() {
        let schema = discrete_schema();
        let data = vec![
            seq(&[0, 0, 1], &["text", "text", "drawing"]),
            seq(&[1, 1, 0], &["drawing", "drawing", "text"]),
        ];
        let (model, _) = HmmModel::fit(schema.clone(), &data).unwrap();
        assert!((model.priors().iter().sum::<f64>() - 1.0).abs() < 1e-9);
        for from in schema.states() {
            let row: f64 = schema
                .states()
                .iter()
                .map(|to| model.transition(from, to).unwrap())
                .sum();
            assert!((row - 1.0).abs() < 1e-9);
        }
        for state in schema.states() {
            match model.emission(state, "length").unwrap() {
                Emission::Categorical(p) => {
                    assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9)
                }
                other => panic!("expected categorical emission, got {other:?}"),
            }
        }
    }
}
