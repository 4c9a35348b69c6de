//! Viterbi decoding: the single most probable state sequence.
//!
//! The recurrence runs in log-space (sums of logs) so that long sequences
//! cannot underflow, while the decoded path is exactly the one the
//! probability-space recurrence would select. Zero probabilities map to
//! `-inf` — a state with zero prior mass stays unreachable at sequence
//! start, and a zero-probability transition is never taken unless every
//! alternative is also impossible.

use ductus_core::{DuctusError, LogProb, Result};

use crate::model::HmmModel;
use crate::observation::{resolve, Observation, Resolved, ValueIndex};

impl HmmModel {
    /// Find the most probable state sequence for an observation sequence.
    ///
    /// Discrete feature values are raw provider values, translated through
    /// `index` before lookup. Returns the decoded path (one label per
    /// observation, in schema spelling) and the joint log probability of
    /// that path. Ties are broken toward the earlier state in schema
    /// order, both in the recurrence and at termination.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the sequence is empty or an observation does not
    ///   conform to the schema
    /// - `Lookup` if a discrete value has no entry in `index`
    pub fn decode(
        &self,
        index: &ValueIndex,
        observations: &[Observation],
    ) -> Result<(Vec<String>, LogProb)> {
        if observations.is_empty() {
            return Err(DuctusError::InvalidInput(
                "observation sequence is empty".into(),
            ));
        }
        let resolved: Vec<Vec<Resolved>> = observations
            .iter()
            .map(|obs| resolve(self.schema(), Some(index), obs))
            .collect::<Result<_>>()?;

        let n = self.schema().n_states();
        let t_len = resolved.len();

        let log_prior: Vec<f64> = (0..n).map(|i| self.prior_at(i).ln()).collect();
        let log_trans: Vec<f64> = (0..n * n)
            .map(|ij| self.transition_at(ij / n, ij % n).ln())
            .collect();

        let mut delta = vec![vec![f64::NEG_INFINITY; n]; t_len];
        let mut psi = vec![vec![0usize; n]; t_len];

        // Initialization
        for i in 0..n {
            delta[0][i] = log_prior[i] + self.log_emission(i, &resolved[0]);
        }

        // Recursion
        for t in 1..t_len {
            for j in 0..n {
                let mut best_val = f64::NEG_INFINITY;
                let mut best_state = 0;
                for i in 0..n {
                    let v = delta[t - 1][i] + log_trans[i * n + j];
                    if v > best_val {
                        best_val = v;
                        best_state = i;
                    }
                }
                delta[t][j] = best_val + self.log_emission(j, &resolved[t]);
                psi[t][j] = best_state;
            }
        }

        // Termination: best final state, earliest wins on ties.
        let mut best_final = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        for i in 0..n {
            if delta[t_len - 1][i] > best_score {
                best_score = delta[t_len - 1][i];
                best_final = i;
            }
        }

        // Backtrack
        let mut path_idx = vec![0usize; t_len];
        path_idx[t_len - 1] = best_final;
        for t in (0..t_len - 1).rev() {
            path_idx[t] = psi[t + 1][path_idx[t + 1]];
        }

        let path = path_idx
            .into_iter()
            .map(|i| self.schema().states()[i].clone())
            .collect();
        Ok((path, LogProb(best_score)))
    }
}
