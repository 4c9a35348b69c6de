//! Turns sketches into the discrete observation sequences the classifier
//! consumes.
//!
//! Each stroke yields five quantized features. The `length` feature is cut
//! at a fixed threshold; the remaining features are binned against
//! per-sketch quantiles, so a bucket value always means "relative to the
//! other strokes of the same sketch".

use ductus_core::{DuctusError, Result};
use ductus_hmm::{FeatureKind, FeatureValue, Observation, Schema};

use crate::stroke::Stroke;

/// State label for non-text (shape) strokes.
pub const STATE_DRAWING: &str = "drawing";
/// State label for handwriting strokes.
pub const STATE_TEXT: &str = "text";

/// Strokes at least this long (in pen coordinate units) fall in the upper
/// `length` bucket.
const LENGTH_THRESHOLD: f64 = 300.0;

/// Nearest-neighbor distance assigned to a stroke with no measurable
/// neighbor.
const NO_NEIGHBOR_DIST: f64 = 1_000_000.0;

/// The feature layout produced by [`extract`], over the states
/// [`STATE_DRAWING`] and [`STATE_TEXT`].
pub fn stroke_schema() -> Result<Schema> {
    Schema::new(
        vec![STATE_DRAWING.into(), STATE_TEXT.into()],
        vec![
            ("length".into(), FeatureKind::Discrete(2)),
            ("nearest_neighbor_dist".into(), FeatureKind::Discrete(2)),
            ("draw_speed".into(), FeatureKind::Discrete(4)),
            ("x".into(), FeatureKind::Discrete(4)),
            ("bb_area".into(), FeatureKind::Discrete(4)),
        ],
    )
}

/// Map a raw shape annotation to its training state, or `None` for
/// annotations outside the domain (e.g. grouping marks).
pub fn map_shape_label(raw: &str) -> Option<&'static str> {
    match raw {
        "Wire" | "AND" | "OR" | "XOR" | "NAND" | "NOT" => Some(STATE_DRAWING),
        "Label" => Some(STATE_TEXT),
        _ => None,
    }
}

/// Quantize a sketch into one observation per stroke, in stroke order.
///
/// Bucket boundaries for `nearest_neighbor_dist` (median), `draw_speed`,
/// `x` and `bb_area` (quartiles) are computed from this sketch alone.
///
/// # Errors
///
/// Returns an error if `strokes` is empty.
pub fn extract(strokes: &[Stroke]) -> Result<Vec<Observation>> {
    if strokes.is_empty() {
        return Err(DuctusError::InvalidInput(
            "cannot extract features from an empty sketch".into(),
        ));
    }

    let lengths: Vec<f64> = strokes.iter().map(Stroke::length).collect();
    let speeds: Vec<f64> = strokes.iter().map(Stroke::draw_speed).collect();
    let xs: Vec<f64> = strokes.iter().map(Stroke::mean_x).collect();
    let areas: Vec<f64> = strokes.iter().map(Stroke::bounding_box_area).collect();
    let nn_dists = nearest_neighbor_dists(strokes);

    let nn_median = quantile(&nn_dists, 0.5);
    let speed_cuts = quartiles(&speeds);
    let x_cuts = quartiles(&xs);
    let area_cuts = quartiles(&areas);

    Ok((0..strokes.len())
        .map(|i| {
            Observation::new()
                .with(
                    "length",
                    FeatureValue::Discrete(usize::from(lengths[i] >= LENGTH_THRESHOLD)),
                )
                .with(
                    "nearest_neighbor_dist",
                    FeatureValue::Discrete(usize::from(nn_dists[i] >= nn_median)),
                )
                .with("draw_speed", FeatureValue::Discrete(bin4(speeds[i], speed_cuts)))
                .with("x", FeatureValue::Discrete(bin4(xs[i], x_cuts)))
                .with("bb_area", FeatureValue::Discrete(bin4(areas[i], area_cuts)))
        })
        .collect())
}

/// Distance from each stroke's start point to the closest point of any
/// other stroke (skipping other strokes' start points). A stroke with no
/// candidate neighbor points gets [`NO_NEIGHBOR_DIST`].
fn nearest_neighbor_dists(strokes: &[Stroke]) -> Vec<f64> {
    strokes
        .iter()
        .enumerate()
        .map(|(i, stroke)| {
            let start = stroke.start();
            let mut closest = NO_NEIGHBOR_DIST;
            for (j, other) in strokes.iter().enumerate() {
                if j == i {
                    continue;
                }
                for p in &other.points()[1..] {
                    closest = closest.min(start.distance(p));
                }
            }
            closest
        })
        .collect()
}

fn quartiles(data: &[f64]) -> [f64; 3] {
    [
        quantile(data, 0.25),
        quantile(data, 0.5),
        quantile(data, 0.75),
    ]
}

fn bin4(value: f64, cuts: [f64; 3]) -> usize {
    if value < cuts[0] {
        0
    } else if value < cuts[1] {
        1
    } else if value < cuts[2] {
        2
    } else {
        3
    }
}

/// Quantile with linear interpolation between order statistics.
fn quantile(data: &[f64], q: f64) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let frac = pos - lo as f64;
    if lo + 1 >= n {
        sorted[n - 1]
    } else {
        sorted[lo] * (1.0 - frac) + sorted[lo + 1] * frac
    }
}
