//! Ink-stroke geometry and feature extraction for the Ductus
//! sketch-understanding ecosystem.
//!
//! [`stroke`] models raw pen input (timestamped point series) and the
//! geometric measurements taken from it; [`features`] quantizes a sketch
//! into the observation sequences `ductus-hmm` trains on and decodes.

pub mod features;
pub mod stroke;

pub use features::{extract, map_shape_label, stroke_schema, STATE_DRAWING, STATE_TEXT};
pub use stroke::{is_temporally_ordered, Point, Stroke};
