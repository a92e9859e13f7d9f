use serde::{Deserialize, Serialize};
use vt_types::{ClassId, MetricsError, VtResult};

/// Confusion counts over a fixed class universe, indexed `[truth][prediction]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    n_classes: usize,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    /// Tally `y_true` against `y_pred`; both must be non-empty, equal length,
    /// and lie below `n_classes`
    pub fn from_predictions(
        n_classes: usize,
        y_true: &[ClassId],
        y_pred: &[ClassId],
    ) -> VtResult<Self> {
        if y_true.len() != y_pred.len() {
            return Err(MetricsError::LengthMismatch {
                truths: y_true.len(),
                predictions: y_pred.len(),
            }
            .into());
        }
        if y_true.is_empty() {
            return Err(MetricsError::EmptyPredictions.into());
        }

        let mut counts = vec![vec![0u64; n_classes]; n_classes];
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            for label in [truth, pred] {
                if label as usize >= n_classes {
                    return Err(MetricsError::LabelOutOfRange { label, n_classes }.into());
                }
            }
            counts[truth as usize][pred as usize] += 1;
        }
        Ok(Self { n_classes, counts })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Count of rows with truth `truth` predicted as `pred`
    pub fn count(&self, truth: usize, pred: usize) -> u64 {
        self.counts[truth][pred]
    }

    /// Rows whose truth is `class`
    pub fn support(&self, class: usize) -> u64 {
        self.counts[class].iter().sum()
    }

    /// Rows predicted as `class`
    pub fn predicted(&self, class: usize) -> u64 {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// Fraction of all rows on the diagonal
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: u64 = (0..self.n_classes).map(|c| self.counts[c][c]).sum();
        correct as f64 / total as f64
    }

    /// Correct predictions of `class` over all predictions of `class`;
    /// 0 when the class was never predicted
    pub fn precision(&self, class: usize) -> f64 {
        let predicted = self.predicted(class);
        if predicted == 0 {
            return 0.0;
        }
        self.counts[class][class] as f64 / predicted as f64
    }

    /// Correct predictions of `class` over its support; 0 for an absent class
    pub fn recall(&self, class: usize) -> f64 {
        let support = self.support(class);
        if support == 0 {
            return 0.0;
        }
        self.counts[class][class] as f64 / support as f64
    }

    /// Harmonic mean of precision and recall; 0 when both are 0
    pub fn f1(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }
}
