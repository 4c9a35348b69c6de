//! Hidden Markov Model estimation and decoding for the Ductus
//! sketch-understanding ecosystem.
//!
//! Labels a temporally ordered observation sequence (for example, the
//! strokes of a sketch described by feature vectors) with the most probable
//! sequence of hidden states. Parameters are estimated by maximum
//! likelihood from fully labeled sequences; decoding is the Viterbi
//! algorithm, run in log-space so long sequences cannot underflow.
//!
//! # Quick start
//!
//! ```
//! use ductus_hmm::{
//!     FeatureKind, FeatureValue, Hmm, Observation, Schema, TrainingSequence, ValueIndex,
//! };
//!
//! # fn main() -> ductus_core::Result<()> {
//! let schema = Schema::new(
//!     vec!["text".into(), "drawing".into()],
//!     vec![("length".into(), FeatureKind::Discrete(2))],
//! )?;
//!
//! let obs = |bucket| Observation::new().with("length", FeatureValue::Discrete(bucket));
//! let seq = TrainingSequence::new(
//!     vec![obs(0), obs(0), obs(1)],
//!     vec!["text".into(), "text".into(), "drawing".into()],
//! )?;
//!
//! let mut hmm = Hmm::new(schema.clone());
//! let report = hmm.train(&[seq])?;
//! assert!(report.has_warnings()); // "drawing" never starts a sequence
//!
//! let index = ValueIndex::identity(&schema);
//! let (path, score) = hmm.decode(&index, &[obs(0), obs(1)])?;
//! assert_eq!(path.len(), 2);
//! assert!(score.0.is_finite());
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod model;
pub mod observation;
pub mod schema;
pub mod train;
mod viterbi;

pub use metrics::ConfusionMatrix;
pub use model::{Emission, Hmm, HmmModel};
pub use observation::{FeatureValue, Observation, TrainingSequence, ValueIndex};
pub use schema::{FeatureKind, Schema};
pub use train::TrainReport;
