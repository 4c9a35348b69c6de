//! Stroke geometry: timestamped point sequences and the measurements the
//! feature extractor is built from.

use std::f64::consts::PI;

use ductus_core::{DuctusError, Result};

/// One sampled pen position.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Sample timestamp in the capture device's clock units.
    pub time: u64,
}

impl Point {
    pub fn new(x: f64, y: f64, time: u64) -> Self {
        Self { x, y, time }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A pen stroke: a temporally ordered series of x/y/time points.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stroke {
    id: String,
    points: Vec<Point>,
}

impl Stroke {
    /// Create a stroke from its point series.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is empty.
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Result<Self> {
        if points.is_empty() {
            return Err(DuctusError::InvalidInput(
                "a stroke requires at least one point".into(),
            ));
        }
        Ok(Self {
            id: id.into(),
            points,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// First sampled point.
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// Polyline length: the sum of Euclidean distances between consecutive
    /// points.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Time spent per sampled point: stroke duration divided by the number
    /// of points.
    pub fn draw_speed(&self) -> f64 {
        let duration = self
            .points
            .last()
            .map(|p| p.time.saturating_sub(self.points[0].time))
            .unwrap_or(0);
        duration as f64 / self.points.len() as f64
    }

    /// Mean x coordinate over all points.
    pub fn mean_x(&self) -> f64 {
        self.points.iter().map(|p| p.x).sum::<f64>() / self.points.len() as f64
    }

    /// Area of the axis-aligned bounding box.
    pub fn bounding_box_area(&self) -> f64 {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        (max_x - min_x) * (max_y - min_y)
    }

    /// Normalized sum of signed curvature along the stroke.
    ///
    /// `transform` is applied to each turning angle before summing (pass
    /// `f64::abs` for total absolute curvature, or the identity for net
    /// curvature). `skip` is a smoothing constant: the number of points to
    /// step between samples (values below 1 are treated as 1). Strokes too
    /// short to contain a turn return 0. The sum is divided by the total
    /// point count.
    pub fn sum_of_curvature<F: Fn(f64) -> f64>(&self, transform: F, skip: usize) -> f64 {
        let skip = skip.max(1);
        let pts = &self.points;
        if pts.len() < 2 * skip + 1 {
            return 0.0;
        }
        let mut total = 0.0;
        let mut second = pts[0];
        let mut third = pts[skip];
        let mut i = 2 * skip;
        while i < pts.len() {
            let first = second;
            second = third;
            third = pts[i];
            i += skip;

            let ax = second.x - first.x;
            let ay = second.y - first.y;
            let bx = third.x - second.x;
            let by = third.y - second.y;
            let len_a = (ax * ax + ay * ay).sqrt();
            let len_b = (bx * bx + by * by).sqrt();
            if len_a == 0.0 || len_b == 0.0 {
                continue;
            }

            // Clamp for floating point drift before acos.
            let arg = ((ax * bx + ay * by) / (len_a * len_b)).clamp(-1.0, 1.0);
            let mut curv = arg.acos();

            // Sign from the angle between the two segment directions.
            let ang_a = ay.atan2(ax);
            let ang_b = by.atan2(bx);
            if !(ang_b < ang_a && ang_b > ang_a - PI) {
                curv = -curv;
            }
            total += transform(curv);
        }
        total / pts.len() as f64
    }
}

/// Whether the strokes of a sketch are ordered by start time.
pub fn is_temporally_ordered(strokes: &[Stroke]) -> bool {
    strokes
        .windows(2)
        .all(|w| w[0].start().time <= w[1].start().time)
}
