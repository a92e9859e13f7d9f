//! Execution backends: where fit units actually run.
//!
//! [`ExecutionBackend`] is the seam between the search driver and whatever
//! infrastructure evaluates units. The driver never sees threads or channels;
//! it submits [`FitUnit`]s and later redeems [`UnitHandle`]s. The bundled
//! [`LocalPoolBackend`] brings up a fixed-size rayon pool at launch and fails
//! the whole search if the pool cannot be built.

use crossbeam_channel::{bounded, Receiver};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use vt_forest::RandomForest;
use vt_metrics::accuracy;
use vt_types::{ClassId, LabeledDataset, SelectorError, VtResult, FEATURE_COUNT};

use crate::cluster::{FitUnit, SchedulerEndpoint, WorkerPoolConfig};
use crate::cv::KFoldPlan;
use crate::driver::forest_config_from_parameters;

/// Immutable data shared by every unit of one search: the training matrix,
/// its class count, and the fold plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchContext {
    data: LabeledDataset,
    n_classes: usize,
    folds: KFoldPlan,
}

impl SearchContext {
    /// Build a context; the fold plan must cover exactly the dataset's rows.
    pub fn new(data: LabeledDataset, n_classes: usize, folds: KFoldPlan) -> VtResult<Self> {
        if folds.rows() != data.len() {
            return Err(SelectorError::PlanMismatch {
                plan_rows: folds.rows(),
                data_rows: data.len(),
            }
            .into());
        }
        Ok(Self {
            data,
            n_classes,
            folds,
        })
    }

    pub fn data(&self) -> &LabeledDataset {
        &self.data
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn folds(&self) -> &KFoldPlan {
        &self.folds
    }
}

/// Outcome of one executed unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub unit_id: uuid::Uuid,
    pub trial_number: usize,
    pub fold: usize,
    /// Validation accuracy on the held-out fold.
    pub score: f64,
    pub duration_ms: u64,
    /// Name of the worker that ran the unit.
    pub worker: String,
}

/// Handle redeemed exactly once for a unit's outcome. Dropping it abandons
/// the result; the unit itself still runs to completion.
pub struct UnitHandle {
    trial_number: usize,
    fold: usize,
    rx: Receiver<VtResult<UnitOutcome>>,
}

impl UnitHandle {
    /// Block until the unit finishes. A disconnected channel means the
    /// backend lost the unit, which is fatal for the search.
    pub fn wait(self) -> VtResult<UnitOutcome> {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(SelectorError::UnitLost {
                trial: self.trial_number,
                fold: self.fold,
            }
            .into()),
        }
    }
}

/// Pluggable execution backend for search units.
///
/// Implementations own worker lifetime. `submit` must not block on unit
/// execution; all waiting happens through the returned handle.
pub trait ExecutionBackend: Send + Sync {
    /// Descriptor of the scheduler this backend submits to.
    fn endpoint(&self) -> &SchedulerEndpoint;

    /// Queue one unit for execution.
    fn submit(&self, unit: FitUnit) -> UnitHandle;
}

/// Execution backend running units on a fixed-size local thread pool.
pub struct LocalPoolBackend {
    pool: ThreadPool,
    context: Arc<SearchContext>,
    endpoint: SchedulerEndpoint,
}

impl LocalPoolBackend {
    /// Bring up the worker pool described by `config`. Pool bring-up failure
    /// is fatal; there is no retry.
    pub fn launch(config: &WorkerPoolConfig, context: Arc<SearchContext>) -> VtResult<Self> {
        if config.workers == 0 {
            return Err(SelectorError::PoolUnavailable {
                message: "worker count must be at least 1".to_string(),
            }
            .into());
        }

        let namespace = config.namespace.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |i| format!("{namespace}-worker-{i}"))
            .build()
            .map_err(|e| SelectorError::PoolUnavailable {
                message: e.to_string(),
            })?;

        let endpoint = SchedulerEndpoint {
            address: format!("local://{}?workers={}", config.namespace, config.workers),
        };
        info!(
            "Worker pool up: {} workers ({} cpus, {} memory, {} accelerators each) at {}",
            config.workers,
            config.resources.cpus,
            config.resources.memory,
            config.resources.accelerators,
            endpoint
        );

        Ok(Self {
            pool,
            context,
            endpoint,
        })
    }
}

impl ExecutionBackend for LocalPoolBackend {
    fn endpoint(&self) -> &SchedulerEndpoint {
        &self.endpoint
    }

    fn submit(&self, unit: FitUnit) -> UnitHandle {
        let (tx, rx) = bounded(1);
        let context = Arc::clone(&self.context);
        let trial_number = unit.trial_number;
        let fold = unit.fold;

        self.pool.spawn(move || {
            let outcome = execute_unit(&context, &unit);
            // The receiver may have been dropped after an earlier failure
            let _ = tx.send(outcome);
        });

        UnitHandle {
            trial_number,
            fold,
            rx,
        }
    }
}

/// Fit and score one (cell, fold) unit, folding any inner error into a
/// unit-scoped failure.
fn execute_unit(context: &SearchContext, unit: &FitUnit) -> VtResult<UnitOutcome> {
    run_unit(context, unit).map_err(|e| {
        SelectorError::UnitFailed {
            trial: unit.trial_number,
            fold: unit.fold,
            message: e.to_string(),
        }
        .into()
    })
}

fn run_unit(context: &SearchContext, unit: &FitUnit) -> VtResult<UnitOutcome> {
    let started = Instant::now();
    let config = forest_config_from_parameters(&unit.parameters, unit.model_seed)?;

    let train_indices = context.folds.train_indices(unit.fold);
    let fold_train = context.data.select(&train_indices);
    let model = RandomForest::fit(&config, &fold_train, context.n_classes)?;

    let (val_start, val_end) = context.folds.validation_bounds(unit.fold);
    let val_rows: Vec<[f64; FEATURE_COUNT]> = context.data.features[val_start..val_end].to_vec();
    let truths: Vec<ClassId> = context.data.labels[val_start..val_end].to_vec();
    let predictions = model.predict_batch(&val_rows);
    let score = accuracy(&truths, &predictions)?;

    let worker = std::thread::current()
        .name()
        .unwrap_or("worker")
        .to_string();
    debug!(
        "Unit done: trial {} fold {} score {:.4} on {}",
        unit.trial_number, unit.fold, score, worker
    );

    Ok(UnitOutcome {
        unit_id: unit.unit_id,
        trial_number: unit.trial_number,
        fold: unit.fold,
        score,
        duration_ms: started.elapsed().as_millis() as u64,
        worker,
    })
}
