//! Classification metrics for decoded label sequences.
//!
//! Provides confusion matrix computation and per-class precision / recall /
//! F1 over string class labels.

use ductus_core::{DuctusError, Result};

/// Row-major confusion matrix: rows are actual classes, columns predicted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from actual and predicted label vectors.
    ///
    /// `classes` fixes the row/column ordering (typically the schema's
    /// state list).
    ///
    /// # Errors
    ///
    /// Returns an error if the label vectors differ in length or contain a
    /// label not present in `classes`.
    pub fn from_labels(
        classes: &[String],
        actual: &[String],
        predicted: &[String],
    ) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(DuctusError::InvalidInput(format!(
                "actual/predicted length mismatch: {} vs {}",
                actual.len(),
                predicted.len()
            )));
        }
        let n = classes.len();
        let class_index = |label: &str| -> Result<usize> {
            classes.iter().position(|c| c == label).ok_or_else(|| {
                DuctusError::InvalidInput(format!("label '{label}' is not a known class"))
            })
        };
        let mut counts = vec![0usize; n * n];
        for (a, p) in actual.iter().zip(predicted) {
            counts[class_index(a)? * n + class_index(p)?] += 1;
        }
        Ok(Self {
            classes: classes.to_vec(),
            counts,
        })
    }

    /// The class ordering.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Count of items of class `actual` predicted as `predicted`.
    pub fn count(&self, actual: &str, predicted: &str) -> Option<usize> {
        let a = self.classes.iter().position(|c| c == actual)?;
        let p = self.classes.iter().position(|c| c == predicted)?;
        Some(self.counts[a * self.classes.len() + p])
    }

    /// Total number of classified items.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Fraction of items on the diagonal; 0.0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let n = self.classes.len();
        let correct: usize = (0..n).map(|i| self.counts[i * n + i]).sum();
        correct as f64 / total as f64
    }

    fn index_of(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    /// Precision for one class: tp / (tp + fp); 0.0 when the class was
    /// never predicted.
    pub fn precision(&self, class: &str) -> Option<f64> {
        let i = self.index_of(class)?;
        let n = self.classes.len();
        let tp = self.counts[i * n + i];
        let predicted: usize = (0..n).map(|a| self.counts[a * n + i]).sum();
        Some(if predicted == 0 {
            0.0
        } else {
            tp as f64 / predicted as f64
        })
    }

    /// Recall for one class: tp / (tp + fn); 0.0 when the class never
    /// occurs.
    pub fn recall(&self, class: &str) -> Option<f64> {
        let i = self.index_of(class)?;
        let n = self.classes.len();
        let tp = self.counts[i * n + i];
        let actual: usize = (0..n).map(|p| self.counts[i * n + p]).sum();
        Some(if actual == 0 {
            0.0
        } else {
            tp as f64 / actual as f64
        })
    }

    /// F1 score for one class: harmonic mean of precision and recall.
    pub fn f1(&self, class: &str) -> Option<f64> {
        let p = self.precision(class)?;
        let r = self.recall(class)?;
        Some(if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> Vec<String> {
        vec!["drawing".into(), "text".into()]
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_and_accuracy() {
        let actual = labels(&["drawing", "drawing", "text", "text", "text"]);
        let predicted = labels(&["drawing", "text", "text", "text", "drawing"]);
        let cm = ConfusionMatrix::from_labels(&classes(), &actual, &predicted).unwrap();
        assert_eq!(cm.count("drawing", "drawing"), Some(1));
        assert_eq!(cm.count("drawing", "text"), Some(1));
        assert_eq!(cm.count("text", "text"), Some(2));
        assert_eq!(cm.count("text", "drawing"), Some(1));
        assert_eq!(cm.total(), 5);
        assert!((cm.accuracy() - 3.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn precision_recall_f1() {
        let actual = labels(&["drawing", "drawing", "text", "text", "text"]);
        let predicted = labels(&["drawing", "text", "text", "text", "drawing"]);
        let cm = ConfusionMatrix::from_labels(&classes(), &actual, &predicted).unwrap();
        // drawing: tp=1, fp=1, fn=1
        assert!((cm.precision("drawing").unwrap() - 0.5).abs() < 1e-12);
        assert!((cm.recall("drawing").unwrap() - 0.5).abs() < 1e-12);
        assert!((cm.f1("drawing").unwrap() - 0.5).abs() < 1e-12);
        // text: tp=2, fp=1, fn=1
        assert!((cm.precision("text").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((cm.recall("text").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(cm.precision("unknown"), None);
    }

    #[test]
    fn perfect_prediction() {
        let actual = labels(&["drawing", "text"]);
        let cm = ConfusionMatrix::from_labels(&classes(), &actual, &actual).unwrap();
        assert_eq!(cm.accuracy(), 1.0);
        assert_eq!(cm.f1("text"), Some(1.0));
    }

    #[test]
    fn never_predicted_class_has_zero_precision() {
        let actual = labels(&["drawing", "drawing"]);
        let predicted = labels(&["text", "text"]);
        let cm = ConfusionMatrix::from_labels(&classes(), &actual, &predicted).unwrap();
        assert_eq!(cm.precision("drawing"), Some(0.0));
        assert_eq!(cm.recall("text"), Some(0.0));
        assert_eq!(cm.f1("drawing"), Some(0.0));
    }

    #[test]
    fn length_mismatch_rejected() {
        let err =
            ConfusionMatrix::from_labels(&classes(), &labels(&["text"]), &labels(&[])).unwrap_err();
        assert!(matches!(err, DuctusError::InvalidInput(_)));
    }

    #[test]
    fn unknown_label_rejected() {
        let err = ConfusionMatrix::from_labels(
            &classes(),
            &labels(&["scribble"]),
            &labels(&["text"]),
        )
        .unwrap_err();
        assert!(matches!(err, DuctusError::InvalidInput(_)));
    }
}
