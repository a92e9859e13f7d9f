//! # vt-pipeline
//!
//! End-to-end wine quality pipeline: load and correct the raw CSV, encode
//! labels, hold out a test split, sweep the hyperparameter grid with k-fold
//! cross-validation on a worker pool, refit the winner on the full training
//! set, and score it on the held-out rows.
//!
//! Every stage failure is fatal; the pipeline never retries or degrades.

pub mod config;

pub use config::{PipelineConfig, WINE_COLUMNS};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use vt_data::{encode_labels, load_wine_csv, train_test_split};
use vt_forest::RandomForest;
use vt_metrics::{average_precision, roc_auc, ClassificationReport, ConfusionMatrix};
use vt_selector::{
    forest_config_from_parameters, run_search, ExecutionBackend, KFoldPlan, LocalPoolBackend,
    ParameterValue, SearchConfig, SearchContext,
};
use vt_types::{DatasetSummary, LabelMap, VtResult};

/// Everything the finished pipeline reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Per-feature statistics of the corrected dataset.
    pub summary: DatasetSummary,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Winning parameter cell of the sweep.
    pub best_parameters: HashMap<String, ParameterValue>,
    /// Mean cross-validated accuracy of the winning cell.
    pub best_cv_score: f64,
    /// Parameter cells evaluated by the sweep.
    pub evaluated_cells: usize,
    /// Held-out per-class precision/recall/F1 table.
    pub classification: ClassificationReport,
    /// Held-out area under the ROC curve.
    pub auroc: f64,
    /// Held-out average precision.
    pub average_precision: f64,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(
            f,
            "Train rows: {}   Test rows: {}",
            self.train_rows, self.test_rows
        )?;

        let mut params: Vec<(&String, &ParameterValue)> = self.best_parameters.iter().collect();
        params.sort_by(|a, b| a.0.cmp(b.0));
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        writeln!(
            f,
            "Best parameters ({} cells evaluated): {}",
            self.evaluated_cells,
            rendered.join(", ")
        )?;
        writeln!(
            f,
            "Best cross-validated accuracy: {:.6}",
            self.best_cv_score
        )?;
        writeln!(f)?;
        writeln!(f, "{}", self.classification)?;
        write!(
            f,
            "The AUROC is {:.6} and the Average Precision is {:.6}",
            self.auroc, self.average_precision
        )
    }
}

/// Run the full pipeline described by `config`.
pub fn run(config: &PipelineConfig) -> VtResult<PipelineReport> {
    // ---- load and correct ----
    let dataset = load_wine_csv(&config.data_path, &config.columns)?;
    let summary = dataset.summary();

    // ---- encode and split ----
    let label_map = LabelMap::fit(&dataset)?;
    let encoded = encode_labels(&dataset, &label_map)?;
    let split = train_test_split(&encoded, config.test_fraction, config.split_seed)?;
    info!(
        "Split {} rows into {} train / {} test (fraction {}, seed {})",
        split.total_rows(),
        split.train.len(),
        split.test.len(),
        config.test_fraction,
        config.split_seed
    );

    // ---- worker pool ----
    let folds = KFoldPlan::new(split.train.len(), config.cv_folds)?;
    let context = Arc::new(SearchContext::new(
        split.train.clone(),
        label_map.n_classes(),
        folds,
    )?);
    let backend = LocalPoolBackend::launch(&config.worker_pool, Arc::clone(&context))?;
    info!(
        "Connected to scheduler {}, ready to fit model",
        backend.endpoint()
    );

    // ---- model selection ----
    let search_config = SearchConfig::new(
        "wine_quality",
        config.search_space.clone(),
        &config.strategy,
    )
    .with_cv_folds(config.cv_folds)
    .with_model_seed(config.model_seed)
    .with_max_trials(config.max_trials)
    .with_concurrency(config.worker_pool.workers);
    let search = run_search(&search_config, &context, &backend)?;
    let best = search.best;

    // ---- final refit on the full training set ----
    let forest_config = forest_config_from_parameters(&best.parameters, config.model_seed)?;
    let model = RandomForest::fit(&forest_config, &split.train, label_map.n_classes())?;
    info!(
        "Refit winning cell on all {} training rows ({} trees)",
        split.train.len(),
        model.n_trees()
    );

    // ---- held-out evaluation ----
    let predictions = model.predict_batch(&split.test.features);
    let matrix =
        ConfusionMatrix::from_predictions(label_map.n_classes(), &split.test.labels, &predictions)?;
    let classification = ClassificationReport::from_matrix(&matrix, &label_map)?;

    // Rank by the predicted class code, mirroring a score-free classifier
    let scores: Vec<f64> = predictions.iter().map(|&p| p as f64).collect();
    let auroc = roc_auc(&split.test.labels, &scores)?;
    let ap = average_precision(&split.test.labels, &scores)?;
    info!(
        "Held-out accuracy {:.4}, AUROC {:.6}, average precision {:.6}",
        matrix.accuracy(),
        auroc,
        ap
    );

    Ok(PipelineReport {
        summary,
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        best_parameters: best.parameters,
        best_cv_score: best.objective,
        evaluated_cells: search.evaluated_cells,
        classification,
        auroc,
        average_precision: ap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use vt_selector::{SearchSpace, WorkerPoolConfig, PARAM_MAX_DEPTH, PARAM_N_TREES};
    use vt_types::{MetricsError, VtError};

    /// Two perfectly separated varieties, interleaved; half the rows carry
    /// the mislabeled quality "1" and get corrected to "Excellent".
    fn separable_csv(pairs: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for _ in 0..pairs {
            writeln!(file, "7.1;0.60;0.10;1.9;0.081;11;34;0.9978;3.30;0.50;9.1;Bad").unwrap();
            writeln!(file, "10.2;0.28;0.45;6.5;0.052;25;60;0.9991;3.05;0.85;12.8;1").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn tiny_pipeline(file: &NamedTempFile) -> PipelineConfig {
        let space = SearchSpace::new()
            .add_int_range(PARAM_N_TREES, 15, 25, 5)
            .add_int_range(PARAM_MAX_DEPTH, 3, 7, 2);

        PipelineConfig::default()
            .with_data_path(file.path())
            .with_search_space(space)
            .with_cv_folds(3)
            .with_worker_pool(WorkerPoolConfig::default().with_workers(2))
    }

    #[test]
    fn test_full_pipeline_on_separable_data() {
        let file = separable_csv(50);
        let config = tiny_pipeline(&file);

        let report = run(&config).unwrap();

        assert_eq!(report.train_rows, 80);
        assert_eq!(report.test_rows, 20);
        assert_eq!(report.evaluated_cells, 4);
        assert!(report.best_cv_score >= 0.99);
        assert!(report.auroc >= 0.99);
        assert!(report.average_precision >= 0.99);
    }

    #[test]
    fn test_report_renders_the_metrics_line_last() {
        let file = separable_csv(50);
        let report = run(&tiny_pipeline(&file)).unwrap();

        let rendered = format!("{report}");
        let last = rendered.lines().last().unwrap();
        assert!(last.starts_with("The AUROC is "));
        assert!(last.contains(" and the Average Precision is "));
        assert!(rendered.contains("Best parameters (4 cells evaluated): "));
        assert!(rendered.contains("Excellent"));
    }

    #[test]
    fn test_relabeled_rows_reach_the_label_map() {
        let file = separable_csv(50);
        let report = run(&tiny_pipeline(&file)).unwrap();

        // "1" never survives as a category; only the corrected name shows up
        let labels: Vec<&str> = report
            .classification
            .rows
            .iter()
            .map(|row| row.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Bad", "Excellent"]);
    }

    #[test]
    fn test_single_category_file_fails_the_binary_metrics() {
        // Every row shares one quality, so the ranking metrics have no
        // negative class to rank against
        let mut file = NamedTempFile::new().unwrap();
        for _ in 0..40 {
            writeln!(file, "7.1;0.60;0.10;1.9;0.081;11;34;0.9978;3.30;0.50;9.1;Good").unwrap();
        }
        file.flush().unwrap();
        let config = tiny_pipeline(&file);

        let err = run(&config).unwrap_err();
        assert!(matches!(
            err,
            VtError::Metrics(MetricsError::NonBinaryLabels { found: 1 })
        ));
    }

    #[test]
    fn test_missing_data_file_is_fatal() {
        let config = PipelineConfig::default().with_data_path("/nonexistent/wine.csv");

        assert!(run(&config).is_err());
    }

    #[test]
    fn test_degenerate_fraction_is_fatal() {
        let file = separable_csv(10);
        let config = tiny_pipeline(&file).with_test_fraction(1.5);

        assert!(run(&config).is_err());
    }
}
