use serde::{Deserialize, Serialize};

/// How many candidate features each node considers when searching for a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Floor of the square root of the feature count, the usual forest default
    Sqrt,
    /// Floor of the base-2 logarithm of the feature count
    Log2,
    /// Every feature at every node (plain bagging)
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete candidate count for `n_features` columns,
    /// always at least 1
    pub fn resolve(&self, n_features: usize) -> usize {
        let picked = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::All => n_features,
        };
        picked.max(1).min(n_features.max(1))
    }
}

/// Configuration for fitting a random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until nodes are pure or too small
    pub max_depth: Option<usize>,
    /// Candidate features considered per split
    pub max_features: MaxFeatures,
    /// Minimum rows a node needs before it may split
    pub min_samples_split: usize,
    /// Minimum rows either child must keep for a split to be accepted
    pub min_samples_leaf: usize,
    /// Seed for bootstrap draws and feature subsampling
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 10,
        }
    }
}

impl RandomForestConfig {
    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
