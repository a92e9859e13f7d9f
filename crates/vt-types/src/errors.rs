use thiserror::Error;

/// Main error type for the Vintry system
#[derive(Error, Debug)]
pub enum VtError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Forest error: {0}")]
    Forest(#[from] ForestError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Dataset loading and preparation errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Cannot open dataset file {path}: {message}")]
    FileAccess { path: String, message: String },

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Row at line {line} has {found} columns, expected {expected}")]
    ColumnCountMismatch {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("Expected {expected} column names, got {found}")]
    ColumnNameCount { found: usize, expected: usize },

    #[error("Dataset contains no rows")]
    EmptyDataset,

    #[error("Quality category not present in the label map: {category}")]
    UnknownCategory { category: String },

    #[error("Feature/label length mismatch: {features} feature rows vs {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Invalid test fraction {fraction}; must be strictly between 0 and 1")]
    InvalidTestFraction { fraction: f64 },

    #[error("Test fraction {fraction} leaves no training rows for a {rows}-row dataset")]
    DegenerateSplit { rows: usize, fraction: f64 },
}

/// Random forest training and prediction errors
#[derive(Error, Debug)]
pub enum ForestError {
    #[error("Cannot fit a forest on an empty training set")]
    EmptyTrainingSet,

    #[error("Label {label} out of range for {n_classes} classes")]
    LabelOutOfRange { label: u32, n_classes: usize },

    #[error("Forest must contain at least one tree")]
    NoTrees,
}

/// Model selection and worker pool errors
#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("Worker pool unavailable: {message}")]
    PoolUnavailable { message: String },

    #[error("Search unit failed (trial {trial}, fold {fold}): {message}")]
    UnitFailed {
        trial: usize,
        fold: usize,
        message: String,
    },

    #[error("Worker pool dropped a unit result (trial {trial}, fold {fold})")]
    UnitLost { trial: usize, fold: usize },

    #[error("Search space expands to an empty grid")]
    EmptyGrid,

    #[error("Unknown search strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("Invalid parameter {name}: {message}")]
    BadParameter { name: String, message: String },

    #[error("Invalid fold count {folds} for {rows} training rows")]
    InvalidFoldCount { folds: usize, rows: usize },

    #[error("Fold plan covers {plan_rows} rows but the dataset has {data_rows}")]
    PlanMismatch { plan_rows: usize, data_rows: usize },
}

/// Evaluation metric errors
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metric is defined for exactly 2 observed classes, found {found}")]
    NonBinaryLabels { found: usize },

    #[error("Cannot compute metrics over an empty prediction set")]
    EmptyPredictions,

    #[error("Length mismatch: {truths} truths vs {predictions} predictions")]
    LengthMismatch { truths: usize, predictions: usize },

    #[error("Class {label} out of range for {n_classes} classes")]
    LabelOutOfRange { label: u32, n_classes: usize },

    #[error("Label map covers {expected} classes but the matrix has {found}")]
    ClassCountMismatch { expected: usize, found: usize },
}

/// Result type alias for Vintry operations
pub type VtResult<T> = Result<T, VtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DataError::ColumnCountMismatch {
            line: 17,
            found: 11,
            expected: 12,
        };

        assert!(error.to_string().contains("line 17"));
        assert!(error.to_string().contains("11"));
        assert!(error.to_string().contains("12"));
    }

    #[test]
    fn test_error_conversion() {
        let data_error = DataError::EmptyDataset;
        let vt_error: VtError = data_error.into();

        match vt_error {
            VtError::Data(_) => (),
            _ => panic!("Expected Data error"),
        }
    }

    #[test]
    fn test_selector_error_conversion() {
        let selector_error = SelectorError::UnitLost { trial: 3, fold: 1 };
        let vt_error: VtError = selector_error.into();

        assert!(vt_error.to_string().contains("trial 3"));
        assert!(vt_error.to_string().contains("fold 1"));
    }

    #[test]
    fn test_non_binary_labels_display() {
        let error = MetricsError::NonBinaryLabels { found: 3 };
        assert!(error.to_string().contains("exactly 2"));
        assert!(error.to_string().contains("found 3"));
    }
}
