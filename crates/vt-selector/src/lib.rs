//! # vt-selector
//!
//! Cross-validated hyperparameter search for Vintry.
//!
//! Provides search space definitions, parameter sweep strategies (grid,
//! random), k-fold planning, trial tracking, and a pluggable execution
//! backend that accepts one fit unit per (parameter cell, fold) pair. The
//! bundled [`LocalPoolBackend`] runs units on a fixed-size local worker pool;
//! the [`ExecutionBackend`] trait is the seam for pointing the same search at
//! an external scheduler.

mod backend;
mod cluster;
mod cv;
mod driver;
mod search;
mod trial;

pub use backend::{ExecutionBackend, LocalPoolBackend, SearchContext, UnitHandle, UnitOutcome};
pub use cluster::{FitUnit, SchedulerEndpoint, WorkerPoolConfig, WorkerResources};
pub use cv::KFoldPlan;
pub use driver::{forest_config_from_parameters, run_search, SearchReport};
pub use search::{
    GridSearch, ParameterDef, ParameterKind, ParameterValue, RandomSearch, SearchSpace,
    SearchStrategy, PARAM_MAX_DEPTH, PARAM_MAX_FEATURES, PARAM_N_TREES,
};
pub use trial::{
    ObjectiveDirection, SearchConfig, SearchState, SearchStatus, Trial, TrialResult, TrialStatus,
};
