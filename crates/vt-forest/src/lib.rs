//! # vt-forest
//!
//! Hand-rolled random forest classifier: CART decision trees with the Gini
//! split criterion, bootstrap sampling, per-node feature subsampling, and
//! parallel tree training via rayon.
//!
//! Training is fully deterministic for a given configuration: every tree
//! derives its own ChaCha8 generator from the configured seed and its tree
//! index, so the ensemble does not depend on thread scheduling.

pub mod config;
pub mod forest;
pub mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use forest::RandomForest;
pub use tree::{DecisionTree, Node, NodeIndex};
