//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use vt_selector::{SearchSpace, WorkerPoolConfig, PARAM_MAX_DEPTH, PARAM_N_TREES};

/// Column names of the wine quality CSV, in file order. The file itself
/// carries no header row.
pub const WINE_COLUMNS: [&str; 12] = [
    "fixedAcidity",
    "volatileAcidity",
    "citricAcid",
    "residualSugar",
    "chlorides",
    "freeSulfurDioxide",
    "totalSulfurDioxide",
    "density",
    "pH",
    "sulphates",
    "Alcohol",
    "Quality",
];

/// Everything the training pipeline needs to run end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Path to the semicolon-separated wine dataset.
    pub data_path: PathBuf,

    /// Column names supplied to the loader, in file order.
    pub columns: Vec<String>,

    /// Fraction of rows held out for the final evaluation.
    pub test_fraction: f64,

    /// Seed for the train/test shuffle.
    pub split_seed: u64,

    /// Hyperparameter grid swept during model selection.
    pub search_space: SearchSpace,

    /// Search strategy name: "grid" or "random".
    pub strategy: String,

    /// Optional cap on search cells; `None` runs the strategy to exhaustion.
    pub max_trials: Option<usize>,

    /// Folds per cross-validated estimate.
    pub cv_folds: usize,

    /// Seed for every forest fit, including the final refit.
    pub model_seed: u64,

    /// Worker pool brought up for the search.
    pub worker_pool: WorkerPoolConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/WineNewGBTDataSet.csv"),
            columns: WINE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            test_fraction: 0.2,
            split_seed: 30,
            search_space: SearchSpace::new()
                .add_int_range(PARAM_N_TREES, 10, 200, 5)
                .add_int_range(PARAM_MAX_DEPTH, 3, 30, 2),
            strategy: "grid".to_string(),
            max_trials: None,
            cv_folds: 3,
            model_seed: 10,
            worker_pool: WorkerPoolConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.search_space = space;
        self
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_model_seed(mut self, seed: u64) -> Self {
        self.model_seed = seed;
        self
    }

    pub fn with_worker_pool(mut self, pool: WorkerPoolConfig) -> Self {
        self.worker_pool = pool;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_covers_the_full_sweep() {
        let config = PipelineConfig::default();

        // 38 tree counts x 14 depths
        assert_eq!(config.search_space.grid_size(), Some(532));
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();

        assert_eq!(config.columns.len(), 12);
        assert_eq!(config.columns[11], "Quality");
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.split_seed, 30);
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.model_seed, 10);
        assert_eq!(config.strategy, "grid");
        assert_eq!(config.worker_pool.workers, 2);
    }

    #[test]
    fn test_builder_methods() {
        let config = PipelineConfig::default()
            .with_data_path("/tmp/wine.csv")
            .with_test_fraction(0.25)
            .with_cv_folds(5);

        assert_eq!(config.data_path, PathBuf::from("/tmp/wine.csv"));
        assert_eq!(config.test_fraction, 0.25);
        assert_eq!(config.cv_folds, 5);
    }
}
