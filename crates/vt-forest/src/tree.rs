use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use vt_types::{ClassId, FEATURE_COUNT};

/// Index of a node within a tree's arena
pub type NodeIndex = usize;

/// Minimum impurity decrease for a split to be worth keeping
const GAIN_EPSILON: f64 = 1e-12;

/// One node of a fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Internal split: rows with `feature < threshold` descend left
    Split {
        feature: usize,
        threshold: f64,
        left: NodeIndex,
        right: NodeIndex,
    },
    /// Terminal node holding the class counts of its training rows
    Leaf { counts: Vec<u32> },
}

/// A CART decision tree trained on a bootstrap sample.
///
/// Nodes live in a flat arena; children are created before their parent, so
/// the root is the last node pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    root: NodeIndex,
}

/// Per-tree growth limits resolved from the forest configuration
#[derive(Debug, Clone)]
pub(crate) struct TreeParams {
    pub n_classes: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Candidate features drawn per node
    pub split_features: usize,
}

impl DecisionTree {
    /// Grow a tree over the rows in `indices`, consuming `rng` for feature
    /// subsampling
    pub(crate) fn fit(
        params: &TreeParams,
        features: &[[f64; FEATURE_COUNT]],
        labels: &[ClassId],
        indices: Vec<usize>,
        rng: ChaCha8Rng,
    ) -> Self {
        let mut builder = TreeBuilder {
            features,
            labels,
            params,
            nodes: Vec::new(),
            rng,
        };
        let root = builder.grow(indices, 0);
        Self {
            nodes: builder.nodes,
            root,
        }
    }

    /// Class counts of the leaf `row` lands in
    pub fn class_counts(&self, row: &[f64; FEATURE_COUNT]) -> &[u32] {
        let mut idx = self.root;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { counts } => return counts,
            }
        }
    }

    /// Majority class of the leaf `row` lands in; ties resolve to the lowest
    /// class code
    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> ClassId {
        let counts = self.class_counts(row);
        let mut best = 0usize;
        let mut best_count = 0u32;
        for (class, &count) in counts.iter().enumerate() {
            if count > best_count {
                best_count = count;
                best = class;
            }
        }
        best as ClassId
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

struct CandidateSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    features: &'a [[f64; FEATURE_COUNT]],
    labels: &'a [ClassId],
    params: &'a TreeParams,
    nodes: Vec<Node>,
    rng: ChaCha8Rng,
}

impl<'a> TreeBuilder<'a> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> NodeIndex {
        let counts = self.class_counts(&indices);
        if self.should_stop(&indices, &counts, depth) {
            return self.push_leaf(counts);
        }
        match self.find_best_split(&indices, &counts) {
            Some(split) => {
                let (left_rows, right_rows) =
                    self.partition(&indices, split.feature, split.threshold);
                let left = self.grow(left_rows, depth + 1);
                let right = self.grow(right_rows, depth + 1);
                let idx = self.nodes.len();
                self.nodes.push(Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                });
                idx
            }
            None => self.push_leaf(counts),
        }
    }

    fn should_stop(&self, indices: &[usize], counts: &[u32], depth: usize) -> bool {
        if indices.len() < self.params.min_samples_split {
            return true;
        }
        if let Some(max) = self.params.max_depth {
            if depth >= max {
                return true;
            }
        }
        // Pure node
        counts.iter().filter(|&&c| c > 0).count() <= 1
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<u32> {
        let mut counts = vec![0u32; self.params.n_classes];
        for &i in indices {
            counts[self.labels[i] as usize] += 1;
        }
        counts
    }

    fn push_leaf(&mut self, counts: Vec<u32>) -> NodeIndex {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { counts });
        idx
    }

    /// Best Gini split over a random feature subset, or `None` when no split
    /// improves on the parent
    fn find_best_split(
        &mut self,
        indices: &[usize],
        parent_counts: &[u32],
    ) -> Option<CandidateSplit> {
        let parent_gini = gini(parent_counts, indices.len());

        let mut candidates: Vec<usize> = (0..FEATURE_COUNT).collect();
        let k = self.params.split_features.min(FEATURE_COUNT);
        let (shuffled, _) = candidates.partial_shuffle(&mut self.rng, k);
        let picked: Vec<usize> = shuffled.to_vec();

        let mut best: Option<CandidateSplit> = None;
        let mut sorted: Vec<(f64, ClassId)> = Vec::with_capacity(indices.len());
        for feature in picked {
            sorted.clear();
            sorted.extend(indices.iter().map(|&i| (self.features[i][feature], self.labels[i])));
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            self.scan_feature(feature, &sorted, parent_gini, parent_counts, &mut best);
        }
        best
    }

    /// Walk the value-sorted rows of one feature, scoring every boundary
    /// between distinct values
    fn scan_feature(
        &self,
        feature: usize,
        sorted: &[(f64, ClassId)],
        parent_gini: f64,
        parent_counts: &[u32],
        best: &mut Option<CandidateSplit>,
    ) {
        let total = sorted.len();
        let mut left_counts = vec![0u32; self.params.n_classes];
        let mut right_counts = parent_counts.to_vec();

        for i in 1..total {
            let (prev_value, prev_label) = sorted[i - 1];
            left_counts[prev_label as usize] += 1;
            right_counts[prev_label as usize] -= 1;

            let value = sorted[i].0;
            if value <= prev_value {
                continue;
            }
            let left_len = i;
            let right_len = total - i;
            if left_len < self.params.min_samples_leaf || right_len < self.params.min_samples_leaf
            {
                continue;
            }

            let weighted = (left_len as f64 * gini(&left_counts, left_len)
                + right_len as f64 * gini(&right_counts, right_len))
                / total as f64;
            let gain = parent_gini - weighted;
            if gain <= GAIN_EPSILON {
                continue;
            }

            let improves = match best {
                None => true,
                Some(current) => gain > current.gain,
            };
            if improves {
                *best = Some(CandidateSplit {
                    feature,
                    // Midpoint between adjacent distinct values
                    threshold: (prev_value + value) / 2.0,
                    gain,
                });
            }
        }
    }

    fn partition(
        &self,
        indices: &[usize],
        feature: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &i in indices {
            if self.features[i][feature] < threshold {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        (left, right)
    }
}

/// Gini impurity of a class count vector
fn gini(counts: &[u32], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / t;
            p * p
        })
        .sum::<f64>()
}
