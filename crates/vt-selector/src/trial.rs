//! Trial tracking and search run management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use vt_types::{SelectorError, VtResult};

use crate::search::{
    GridSearch, ParameterValue, RandomSearch, SearchSpace, SearchStrategy,
};

/// Unique search run identifier.
pub type SearchId = Uuid;

/// Whether we are maximizing or minimizing the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    Maximize,
    Minimize,
}

impl Default for ObjectiveDirection {
    fn default() -> Self {
        Self::Maximize
    }
}

/// Top-level configuration for a model-selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub id: SearchId,
    pub name: String,

    /// The hyperparameter search space.
    pub search_space: SearchSpace,

    /// Which search strategy to use: "grid" or "random".
    pub strategy: String,

    /// Folds per cross-validated estimate.
    pub cv_folds: usize,

    /// Batch size when pulling cells from the strategy.
    pub concurrency: usize,

    /// Metric being optimized (mean validation-fold accuracy).
    pub objective_metric: String,

    /// Direction of optimization.
    pub direction: ObjectiveDirection,

    /// Seed handed to every forest fit, including the final refit.
    pub model_seed: u64,

    /// Cap on cells for non-exhaustive strategies; `None` lets the strategy
    /// run until it is out of suggestions.
    pub max_trials: Option<usize>,

    pub created_at: DateTime<Utc>,
}

impl SearchConfig {
    pub fn new(name: impl Into<String>, search_space: SearchSpace, strategy: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            search_space,
            strategy: strategy.to_string(),
            cv_folds: 3,
            concurrency: 4,
            objective_metric: "accuracy".to_string(),
            direction: ObjectiveDirection::Maximize,
            model_seed: 10,
            max_trials: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_model_seed(mut self, seed: u64) -> Self {
        self.model_seed = seed;
        self
    }

    pub fn with_max_trials(mut self, max_trials: Option<usize>) -> Self {
        self.max_trials = max_trials;
        self
    }

    pub fn with_objective(mut self, metric: &str, direction: ObjectiveDirection) -> Self {
        self.objective_metric = metric.to_string();
        self.direction = direction;
        self
    }

    /// Instantiate the configured strategy.
    ///
    /// Random search draws with the model seed so repeated runs suggest the
    /// same cells; it also requires `max_trials`, otherwise it would never
    /// exhaust.
    pub fn build_strategy(&self) -> VtResult<Box<dyn SearchStrategy>> {
        match self.strategy.as_str() {
            "grid" => Ok(Box::new(GridSearch::new(self.search_space.clone()))),
            "random" => {
                if self.max_trials.is_none() {
                    return Err(vt_types::VtError::Config(
                        "random search requires max_trials".to_string(),
                    ));
                }
                Ok(Box::new(RandomSearch::new(
                    self.search_space.clone(),
                    self.model_seed,
                )))
            }
            other => Err(SelectorError::UnknownStrategy {
                name: other.to_string(),
            }
            .into()),
        }
    }
}

/// Lifecycle state for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Aggregate status of a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub id: SearchId,
    pub config: SearchConfig,
    pub state: SearchState,
    pub trials: Vec<Trial>,
    pub trials_completed: usize,
    pub trials_failed: usize,
    pub best_trial: Option<TrialResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SearchStatus {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            id: config.id,
            config,
            state: SearchState::Pending,
            trials: Vec::new(),
            trials_completed: 0,
            trials_failed: 0,
            best_trial: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = SearchState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = SearchState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = SearchState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Record a finished trial and its contribution to the counts.
    pub fn record_trial(&mut self, trial: Trial) {
        match trial.status {
            TrialStatus::Completed => self.trials_completed += 1,
            TrialStatus::Failed => self.trials_failed += 1,
            _ => {}
        }
        self.trials.push(trial);
    }

    /// Update the best trial if `result` strictly improves on the current
    /// best; ties keep the earlier trial.
    pub fn update_best(&mut self, result: &TrialResult) {
        let improves = match &self.best_trial {
            None => true,
            Some(current_best) => match self.config.direction {
                ObjectiveDirection::Maximize => result.objective > current_best.objective,
                ObjectiveDirection::Minimize => result.objective < current_best.objective,
            },
        };
        if improves {
            self.best_trial = Some(result.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Individual trial
// ---------------------------------------------------------------------------

/// A single trial: one parameter cell evaluated across all folds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    pub search_id: SearchId,
    pub trial_number: usize,
    pub parameters: HashMap<String, ParameterValue>,
    pub status: TrialStatus,
    pub result: Option<TrialResult>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub worker_id: Option<String>,
    pub error: Option<String>,
}

impl Trial {
    pub fn new(
        search_id: SearchId,
        trial_number: usize,
        parameters: HashMap<String, ParameterValue>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            search_id,
            trial_number,
            parameters,
            status: TrialStatus::Pending,
            result: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            worker_id: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self, worker_id: Option<String>) {
        self.status = TrialStatus::Running;
        self.started_at = Some(Utc::now());
        self.worker_id = worker_id;
    }

    pub fn mark_completed(&mut self, result: TrialResult) {
        self.status = TrialStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn mark_failed(&mut self, error: String) {
        self.status = TrialStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result of a single trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: Uuid,
    /// Mean validation score across folds.
    pub objective: f64,
    /// Per-fold validation scores, in fold order.
    pub fold_scores: Vec<f64>,
    pub parameters: HashMap<String, ParameterValue>,
    pub duration_ms: Option<u64>,
}
