use crate::dataset::Dataset;
use crate::errors::{DataError, VtResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Integer code assigned to one quality category
pub type ClassId = u32;

/// Bijective mapping between raw quality categories and integer class codes.
///
/// Codes are assigned in sorted (lexicographic) order of the distinct
/// categories, so the mapping depends only on the set of observed values and
/// never on row order. Train and test partitions must be encoded through the
/// same map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    categories: Vec<String>,
}

impl LabelMap {
    /// Collect the distinct quality categories of `dataset` into a new map
    pub fn fit(dataset: &Dataset) -> VtResult<Self> {
        let distinct: BTreeSet<&str> = dataset
            .samples()
            .iter()
            .map(|s| s.quality.as_str())
            .collect();
        if distinct.is_empty() {
            return Err(DataError::EmptyDataset.into());
        }
        Ok(Self {
            categories: distinct.into_iter().map(String::from).collect(),
        })
    }

    pub fn encode(&self, category: &str) -> VtResult<ClassId> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .map(|idx| idx as ClassId)
            .map_err(|_| {
                DataError::UnknownCategory {
                    category: category.to_string(),
                }
                .into()
            })
    }

    pub fn decode(&self, code: ClassId) -> Option<&str> {
        self.categories.get(code as usize).map(String::as_str)
    }

    pub fn n_classes(&self) -> usize {
        self.categories.len()
    }

    /// Category names in code order
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}
