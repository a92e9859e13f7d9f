use crate::dataset::FEATURE_COUNT;
use crate::errors::{DataError, VtResult};
use crate::labels::ClassId;
use serde::{Deserialize, Serialize};

/// Feature matrix and encoded labels kept as parallel arrays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDataset {
    pub features: Vec<[f64; FEATURE_COUNT]>,
    pub labels: Vec<ClassId>,
}

impl LabeledDataset {
    pub fn new(features: Vec<[f64; FEATURE_COUNT]>, labels: Vec<ClassId>) -> VtResult<Self> {
        if features.len() != labels.len() {
            return Err(DataError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            }
            .into());
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Copy of the rows at `indices`, in index order
    pub fn select(&self, indices: &[usize]) -> Self {
        let features = indices.iter().map(|&i| self.features[i]).collect();
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        Self { features, labels }
    }
}

/// Disjoint train/test partition of a labeled dataset, with the parameters
/// that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train: LabeledDataset,
    pub test: LabeledDataset,
    pub test_fraction: f64,
    pub seed: u64,
}

impl TrainTestSplit {
    pub fn total_rows(&self) -> usize {
        self.train.len() + self.test.len()
    }
}
