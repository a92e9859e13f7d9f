use crate::config::RandomForestConfig;
use crate::tree::{DecisionTree, TreeParams};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vt_types::{ClassId, ForestError, LabeledDataset, VtResult, FEATURE_COUNT};

/// Bagged ensemble of CART decision trees.
///
/// Each tree trains on a bootstrap sample of the data with its own generator
/// seeded from `config.seed` plus the tree index, so fits are reproducible no
/// matter how rayon schedules them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    config: RandomForestConfig,
    n_classes: usize,
}

impl RandomForest {
    /// Train a forest on `data`, whose labels must all lie below `n_classes`
    pub fn fit(
        config: &RandomForestConfig,
        data: &LabeledDataset,
        n_classes: usize,
    ) -> VtResult<Self> {
        if data.is_empty() {
            return Err(ForestError::EmptyTrainingSet.into());
        }
        if config.n_trees == 0 {
            return Err(ForestError::NoTrees.into());
        }
        if let Some(&bad) = data.labels.iter().find(|&&l| (l as usize) >= n_classes) {
            return Err(ForestError::LabelOutOfRange {
                label: bad,
                n_classes,
            }
            .into());
        }

        let params = TreeParams {
            n_classes,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            split_features: config.max_features.resolve(FEATURE_COUNT),
        };

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));
                let sample = bootstrap_indices(data.len(), &mut rng);
                DecisionTree::fit(&params, &data.features, &data.labels, sample, rng)
            })
            .collect();

        debug!(
            "Fitted {} trees on {} rows ({} classes)",
            trees.len(),
            data.len(),
            n_classes
        );
        Ok(Self {
            trees,
            config: config.clone(),
            n_classes,
        })
    }

    /// Mean leaf class distribution across all trees
    pub fn predict_proba(&self, row: &[f64; FEATURE_COUNT]) -> Vec<f64> {
        let mut acc = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let counts = tree.class_counts(row);
            let total: u32 = counts.iter().sum();
            if total > 0 {
                for (slot, &count) in acc.iter_mut().zip(counts) {
                    *slot += count as f64 / total as f64;
                }
            }
        }
        let k = self.trees.len() as f64;
        for slot in &mut acc {
            *slot /= k;
        }
        acc
    }

    /// Highest mean-probability class; ties resolve to the lowest class code
    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> ClassId {
        let proba = self.predict_proba(row);
        let mut best = 0usize;
        let mut best_p = f64::NEG_INFINITY;
        for (class, &p) in proba.iter().enumerate() {
            if p > best_p {
                best_p = p;
                best = class;
            }
        }
        best as ClassId
    }

    /// Predict every row, in input order
    pub fn predict_batch(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<ClassId> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }
}

/// Draw `n` row indices with replacement
fn bootstrap_indices(n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}
