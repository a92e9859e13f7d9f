use crate::confusion::ConfusionMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use vt_types::{LabelMap, MetricsError, VtResult};

/// Per-class row of the classification report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReportRow {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Averaged precision/recall/F1 triple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportAverages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class precision/recall/F1 table with accuracy and macro/weighted
/// averages, in the layout every scikit user recognizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub rows: Vec<ClassReportRow>,
    pub accuracy: f64,
    pub macro_avg: ReportAverages,
    pub weighted_avg: ReportAverages,
    pub total_support: u64,
}

impl ClassificationReport {
    /// Build the report from a confusion matrix, naming classes through the
    /// label map that encoded them
    pub fn from_matrix(matrix: &ConfusionMatrix, labels: &LabelMap) -> VtResult<Self> {
        if labels.n_classes() != matrix.n_classes() {
            return Err(MetricsError::ClassCountMismatch {
                expected: labels.n_classes(),
                found: matrix.n_classes(),
            }
            .into());
        }

        let total_support = matrix.total();
        let mut rows = Vec::with_capacity(matrix.n_classes());
        let mut macro_avg = ReportAverages {
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
        };
        let mut weighted_avg = macro_avg;

        for class in 0..matrix.n_classes() {
            let precision = matrix.precision(class);
            let recall = matrix.recall(class);
            let f1 = matrix.f1(class);
            let support = matrix.support(class);

            macro_avg.precision += precision;
            macro_avg.recall += recall;
            macro_avg.f1 += f1;

            let weight = support as f64 / total_support as f64;
            weighted_avg.precision += precision * weight;
            weighted_avg.recall += recall * weight;
            weighted_avg.f1 += f1 * weight;

            rows.push(ClassReportRow {
                label: labels
                    .decode(class as u32)
                    .unwrap_or("<unknown>")
                    .to_string(),
                precision,
                recall,
                f1,
                support,
            });
        }

        let k = matrix.n_classes() as f64;
        macro_avg.precision /= k;
        macro_avg.recall /= k;
        macro_avg.f1 /= k;

        Ok(Self {
            rows,
            accuracy: matrix.accuracy(),
            macro_avg,
            weighted_avg,
            total_support,
        })
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.label.len())
            .max()
            .unwrap_or(0)
            .max("weighted avg".len());

        writeln!(
            f,
            "{:>width$}  precision    recall  f1-score   support",
            "",
            width = name_width
        )?;
        writeln!(f)?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>8.2}  {:>8.2}  {:>8}",
                row.label,
                row.precision,
                row.recall,
                row.f1,
                row.support,
                width = name_width
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>8}  {:>8.2}  {:>8}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support,
            width = name_width
        )?;
        writeln!(
            f,
            "{:>width$}  {:>9.2}  {:>8.2}  {:>8.2}  {:>8}",
            "macro avg",
            self.macro_avg.precision,
            self.macro_avg.recall,
            self.macro_avg.f1,
            self.total_support,
            width = name_width
        )?;
        writeln!(
            f,
            "{:>width$}  {:>9.2}  {:>8.2}  {:>8.2}  {:>8}",
            "weighted avg",
            self.weighted_avg.precision,
            self.weighted_avg.recall,
            self.weighted_avg.f1,
            self.total_support,
            width = name_width
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vt_types::{Dataset, WineSample, FEATURE_COUNT};

    fn label_map(categories: &[&str]) -> LabelMap {
        let samples = categories
            .iter()
            .map(|c| WineSample::new([0.0; FEATURE_COUNT], c.to_string()))
            .collect();
        let dataset = Dataset::new(vec!["c".to_string(); FEATURE_COUNT + 1], samples);
        LabelMap::fit(&dataset).unwrap()
    }

    #[test]
    fn test_report_values() {
        // Bad=0, Good=1 after sorting
        let map = label_map(&["Bad", "Good"]);
        let y_true = vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
        let y_pred = vec![0, 0, 0, 1, 1, 1, 1, 1, 0, 0];
        let cm = ConfusionMatrix::from_predictions(2, &y_true, &y_pred).unwrap();

        let report = ClassificationReport::from_matrix(&cm, &map).unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].label, "Bad");
        assert_eq!(report.rows[0].support, 4);
        assert_eq!(report.rows[1].label, "Good");
        assert!((report.accuracy - 0.7).abs() < 1e-12);
        assert_eq!(report.total_support, 10);

        let expected_macro_p = (0.6 + 0.8) / 2.0;
        assert!((report.macro_avg.precision - expected_macro_p).abs() < 1e-12);

        let expected_weighted_p = 0.6 * 0.4 + 0.8 * 0.6;
        assert!((report.weighted_avg.precision - expected_weighted_p).abs() < 1e-12);
    }

    #[test]
    fn test_class_count_mismatch_is_rejected() {
        let map = label_map(&["Bad", "Good", "Excellent"]);
        let cm = ConfusionMatrix::from_predictions(2, &[0, 1], &[0, 1]).unwrap();

        let result = ClassificationReport::from_matrix(&cm, &map);

        assert!(result.is_err());
    }

    #[test]
    fn test_display_layout() {
        let map = label_map(&["Bad", "Good"]);
        let cm = ConfusionMatrix::from_predictions(2, &[0, 1, 1], &[0, 1, 0]).unwrap();
        let report = ClassificationReport::from_matrix(&cm, &map).unwrap();

        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("recall"));
        assert!(text.contains("f1-score"));
        assert!(text.contains("support"));
        assert!(text.contains("Bad"));
        assert!(text.contains("Good"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("macro avg"));
        assert!(text.contains("weighted avg"));
    }
}
