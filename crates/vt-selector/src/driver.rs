//! Search driver: pulls parameter cells from the strategy, fans each cell
//! out as one fit unit per fold, and tracks the best trial.
//!
//! Any unit failure aborts the whole search; there are no retries and no
//! partial results.

use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use vt_forest::{MaxFeatures, RandomForestConfig};
use vt_types::{SelectorError, VtResult};

use crate::backend::{ExecutionBackend, SearchContext, UnitHandle};
use crate::cluster::FitUnit;
use crate::search::{ParameterValue, PARAM_MAX_DEPTH, PARAM_MAX_FEATURES, PARAM_N_TREES};
use crate::trial::{SearchConfig, SearchStatus, Trial, TrialResult};

/// Translate a parameter cell into a forest configuration.
///
/// `n_trees` is required and must be positive. `max_depth` and
/// `max_features` are optional and fall back to the forest defaults.
pub fn forest_config_from_parameters(
    parameters: &HashMap<String, ParameterValue>,
    seed: u64,
) -> VtResult<RandomForestConfig> {
    let n_trees = match parameters.get(PARAM_N_TREES) {
        Some(ParameterValue::Int(n)) if *n > 0 => *n as usize,
        Some(other) => {
            return Err(SelectorError::BadParameter {
                name: PARAM_N_TREES.to_string(),
                message: format!("expected a positive integer, got {other}"),
            }
            .into())
        }
        None => {
            return Err(SelectorError::BadParameter {
                name: PARAM_N_TREES.to_string(),
                message: "parameter is missing".to_string(),
            }
            .into())
        }
    };

    let mut config = RandomForestConfig::default()
        .with_n_trees(n_trees)
        .with_seed(seed);

    match parameters.get(PARAM_MAX_DEPTH) {
        Some(ParameterValue::Int(depth)) if *depth > 0 => {
            config = config.with_max_depth(Some(*depth as usize));
        }
        Some(other) => {
            return Err(SelectorError::BadParameter {
                name: PARAM_MAX_DEPTH.to_string(),
                message: format!("expected a positive integer, got {other}"),
            }
            .into())
        }
        None => {}
    }

    if let Some(value) = parameters.get(PARAM_MAX_FEATURES) {
        let policy = match value {
            ParameterValue::Json(serde_json::Value::String(name)) => match name.as_str() {
                "sqrt" => MaxFeatures::Sqrt,
                "log2" => MaxFeatures::Log2,
                "all" => MaxFeatures::All,
                other => {
                    return Err(SelectorError::BadParameter {
                        name: PARAM_MAX_FEATURES.to_string(),
                        message: format!("unknown policy {other:?}"),
                    }
                    .into())
                }
            },
            other => {
                return Err(SelectorError::BadParameter {
                    name: PARAM_MAX_FEATURES.to_string(),
                    message: format!("expected \"sqrt\", \"log2\" or \"all\", got {other}"),
                }
                .into())
            }
        };
        config = config.with_max_features(policy);
    }

    Ok(config)
}

/// Final report of a search run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Full trial-by-trial record of the run.
    pub status: SearchStatus,
    /// The winning trial.
    pub best: TrialResult,
    /// Number of parameter cells evaluated.
    pub evaluated_cells: usize,
    /// Total (cell, fold) units executed.
    pub total_units: usize,
}

/// Run a full model-selection sweep against `backend`.
///
/// Cells come from the configured strategy in its deterministic order; each
/// cell becomes one unit per fold of `context`'s plan, submitted together and
/// collected in submission order. The objective is the mean validation score
/// across folds.
pub fn run_search(
    config: &SearchConfig,
    context: &SearchContext,
    backend: &dyn ExecutionBackend,
) -> VtResult<SearchReport> {
    let mut strategy = config.build_strategy()?;
    let folds = context.folds().k();

    let mut status = SearchStatus::new(config.clone());
    status.mark_running();
    info!(
        "Search '{}' started: {} strategy, {} folds, objective {}, scheduler {}",
        config.name,
        strategy.name(),
        folds,
        config.objective_metric,
        backend.endpoint()
    );
    if let Some(cells) = config.search_space.grid_size() {
        debug!("Search space expands to {} grid cells", cells);
    }

    let mut submitted = 0usize;
    let mut completed = 0usize;
    let mut total_units = 0usize;

    loop {
        let mut batch_size = config.concurrency.max(1);
        if let Some(max) = config.max_trials {
            let remaining = max.saturating_sub(submitted);
            if remaining == 0 {
                break;
            }
            batch_size = batch_size.min(remaining);
        }
        let batch = strategy.suggest(batch_size);
        if batch.is_empty() {
            break;
        }

        // Submit every unit of the batch before collecting any result, so
        // the pool stays saturated across trial boundaries.
        let mut in_flight = Vec::with_capacity(batch.len());
        for parameters in batch {
            let mut trial = Trial::new(config.id, submitted, parameters.clone());
            trial.mark_running(None);

            let handles: Vec<UnitHandle> = (0..folds)
                .map(|fold| {
                    backend.submit(FitUnit {
                        unit_id: Uuid::new_v4(),
                        search_id: config.id,
                        trial_number: trial.trial_number,
                        fold,
                        parameters: parameters.clone(),
                        model_seed: config.model_seed,
                    })
                })
                .collect();

            in_flight.push((trial, parameters, handles));
            submitted += 1;
        }

        for (mut trial, parameters, handles) in in_flight {
            let mut fold_scores = Vec::with_capacity(folds);
            let mut duration_ms = 0u64;
            for handle in handles {
                match handle.wait() {
                    Ok(outcome) => {
                        if trial.worker_id.is_none() {
                            trial.worker_id = Some(outcome.worker.clone());
                        }
                        fold_scores.push(outcome.score);
                        duration_ms = duration_ms.max(outcome.duration_ms);
                    }
                    Err(e) => {
                        let message = e.to_string();
                        trial.mark_failed(message.clone());
                        status.record_trial(trial);
                        status.mark_failed(message);
                        return Err(e);
                    }
                }
            }

            total_units += folds;
            let objective = fold_scores.iter().sum::<f64>() / folds as f64;
            strategy.report(&parameters, objective);

            let result = TrialResult {
                trial_id: trial.id,
                objective,
                fold_scores,
                parameters,
                duration_ms: Some(duration_ms),
            };
            status.update_best(&result);
            trial.mark_completed(result);
            status.record_trial(trial);

            completed += 1;
            if completed % 50 == 0 {
                let best_so_far = status
                    .best_trial
                    .as_ref()
                    .map(|b| b.objective)
                    .unwrap_or(f64::NAN);
                info!(
                    "Evaluated {} cells, best objective so far {:.4}",
                    completed, best_so_far
                );
            }
        }
    }

    let best = status.best_trial.clone().ok_or(SelectorError::EmptyGrid)?;
    status.mark_completed();
    info!(
        "Search '{}' completed: {} cells over {} units, best {} {:.4}",
        config.name, completed, total_units, config.objective_metric, best.objective
    );

    Ok(SearchReport {
        status,
        best,
        evaluated_cells: completed,
        total_units,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalPoolBackend;
    use crate::cluster::WorkerPoolConfig;
    use crate::cv::KFoldPlan;
    use crate::search::SearchSpace;
    use std::sync::Arc;
    use vt_types::{LabeledDataset, FEATURE_COUNT};

    fn context(rows: usize, folds: usize) -> Arc<SearchContext> {
        let features = (0..rows)
            .map(|i| {
                let mut row = [0.0; FEATURE_COUNT];
                row[0] = if i % 2 == 0 { i as f64 } else { 100.0 + i as f64 };
                row[3] = (i % 2) as f64 * 10.0;
                row
            })
            .collect();
        let labels = (0..rows).map(|i| (i % 2) as u32).collect();
        let data = LabeledDataset::new(features, labels).unwrap();
        let plan = KFoldPlan::new(rows, folds).unwrap();
        Arc::new(SearchContext::new(data, 2, plan).unwrap())
    }

    fn tiny_config() -> SearchConfig {
        let space = SearchSpace::new()
            .add_int_range(PARAM_N_TREES, 10, 20, 5)
            .add_int_range(PARAM_MAX_DEPTH, 3, 7, 2);

        SearchConfig::new("driver_test", space, "grid")
            .with_cv_folds(3)
            .with_model_seed(10)
            .with_concurrency(2)
    }

    fn int_param(result: &TrialResult, name: &str) -> i64 {
        match result.parameters.get(name) {
            Some(ParameterValue::Int(v)) => *v,
            other => panic!("expected Int for {name}, got {other:?}"),
        }
    }

    #[test]
    fn test_grid_run_covers_every_cell() {
        let context = context(30, 3);
        let backend =
            LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context)).unwrap();
        let config = tiny_config();

        let report = run_search(&config, &context, &backend).unwrap();

        assert_eq!(report.evaluated_cells, 4);
        assert_eq!(report.total_units, 12);
        assert_eq!(report.status.trials_completed, 4);
        assert_eq!(report.status.trials_failed, 0);
        assert_eq!(report.best.fold_scores.len(), 3);
    }

    #[test]
    fn test_best_parameters_come_from_the_grid() {
        let context = context(30, 3);
        let backend =
            LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context)).unwrap();

        let report = run_search(&tiny_config(), &context, &backend).unwrap();

        assert!([10, 15].contains(&int_param(&report.best, PARAM_N_TREES)));
        assert!([3, 5].contains(&int_param(&report.best, PARAM_MAX_DEPTH)));
        assert!(report.best.objective >= 0.0 && report.best.objective <= 1.0);
    }

    #[test]
    fn test_repeated_runs_pick_the_same_winner() {
        let context = context(30, 3);
        let config = tiny_config();

        let first = {
            let backend =
                LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context))
                    .unwrap();
            run_search(&config, &context, &backend).unwrap()
        };
        let second = {
            let backend =
                LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context))
                    .unwrap();
            run_search(&config, &context, &backend).unwrap()
        };

        assert_eq!(first.best.objective, second.best.objective);
        assert_eq!(first.best.parameters, second.best.parameters);
        assert_eq!(first.best.fold_scores, second.best.fold_scores);
    }

    #[test]
    fn test_max_trials_caps_the_sweep() {
        let context = context(30, 3);
        let backend =
            LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context)).unwrap();
        let config = tiny_config().with_max_trials(Some(3));

        let report = run_search(&config, &context, &backend).unwrap();

        assert_eq!(report.evaluated_cells, 3);
        assert_eq!(report.total_units, 9);
    }

    #[test]
    fn test_failing_unit_aborts_the_search() {
        let context = context(30, 3);
        let backend =
            LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context)).unwrap();
        // n_trees axis [0, 5) step 5 yields the single invalid value 0
        let space = SearchSpace::new().add_int_range(PARAM_N_TREES, 0, 5, 5);
        let config = SearchConfig::new("broken", space, "grid").with_cv_folds(3);

        let err = run_search(&config, &context, &backend).unwrap_err();
        assert!(err.to_string().contains("trial 0"));
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let context = context(30, 3);
        let backend =
            LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context)).unwrap();
        let space = SearchSpace::new().add_int_range(PARAM_N_TREES, 10, 10, 5);
        let config = SearchConfig::new("empty", space, "grid").with_cv_folds(3);

        let err = run_search(&config, &context, &backend).unwrap_err();
        assert!(matches!(
            err,
            vt_types::VtError::Selector(SelectorError::EmptyGrid)
        ));
    }

    #[test]
    fn test_trials_are_numbered_in_grid_order() {
        let context = context(30, 3);
        let backend =
            LocalPoolBackend::launch(&WorkerPoolConfig::default(), Arc::clone(&context)).unwrap();

        let report = run_search(&tiny_config(), &context, &backend).unwrap();

        let numbers: Vec<usize> = report
            .status
            .trials
            .iter()
            .map(|t| t.trial_number)
            .collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);
        // Axis-major order: later parameters vary fastest
        let first = report.status.trials[0].result.as_ref().unwrap();
        let second = report.status.trials[1].result.as_ref().unwrap();
        assert_eq!(int_param(first, PARAM_N_TREES), 10);
        assert_eq!(int_param(first, PARAM_MAX_DEPTH), 3);
        assert_eq!(int_param(second, PARAM_N_TREES), 10);
        assert_eq!(int_param(second, PARAM_MAX_DEPTH), 5);
    }

    #[test]
    fn test_forest_config_translation() {
        let mut parameters = HashMap::new();
        parameters.insert(PARAM_N_TREES.to_string(), ParameterValue::Int(25));
        parameters.insert(PARAM_MAX_DEPTH.to_string(), ParameterValue::Int(7));
        parameters.insert(
            PARAM_MAX_FEATURES.to_string(),
            ParameterValue::Json(serde_json::Value::String("log2".to_string())),
        );

        let config = forest_config_from_parameters(&parameters, 99).unwrap();

        assert_eq!(config.n_trees, 25);
        assert_eq!(config.max_depth, Some(7));
        assert_eq!(config.max_features, MaxFeatures::Log2);
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_forest_config_defaults_for_optional_parameters() {
        let mut parameters = HashMap::new();
        parameters.insert(PARAM_N_TREES.to_string(), ParameterValue::Int(40));

        let config = forest_config_from_parameters(&parameters, 10).unwrap();

        assert_eq!(config.n_trees, 40);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.max_features, MaxFeatures::Sqrt);
    }

    #[test]
    fn test_forest_config_rejects_bad_parameters() {
        let empty = HashMap::new();
        assert!(forest_config_from_parameters(&empty, 10).is_err());

        let mut zero_trees = HashMap::new();
        zero_trees.insert(PARAM_N_TREES.to_string(), ParameterValue::Int(0));
        assert!(forest_config_from_parameters(&zero_trees, 10).is_err());

        let mut bad_policy = HashMap::new();
        bad_policy.insert(PARAM_N_TREES.to_string(), ParameterValue::Int(10));
        bad_policy.insert(
            PARAM_MAX_FEATURES.to_string(),
            ParameterValue::Json(serde_json::Value::String("half".to_string())),
        );
        assert!(forest_config_from_parameters(&bad_policy, 10).is_err());
    }
}
