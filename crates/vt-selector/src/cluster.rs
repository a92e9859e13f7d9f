//! Worker pool configuration and the serializable unit of search work.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::search::ParameterValue;

/// Resource request for a single worker, in the shape an external scheduler
/// accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResources {
    /// CPU units per worker (fractional ok).
    pub cpus: f64,
    /// Memory units per worker.
    pub memory: u64,
    /// Accelerator units per worker (0 = none).
    pub accelerators: f64,
}

impl Default for WorkerResources {
    fn default() -> Self {
        Self {
            cpus: 1.0,
            memory: 2,
            accelerators: 0.0,
        }
    }
}

/// Worker pool requested for one selection run. Sized once at bring-up; the
/// pool never grows or shrinks mid-search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of workers to bring up.
    pub workers: usize,

    /// Per-worker resource request.
    pub resources: WorkerResources,

    /// Namespace used when naming workers and scheduler entries.
    pub namespace: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            resources: WorkerResources::default(),
            namespace: "vintry".to_string(),
        }
    }
}

impl WorkerPoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_resources(mut self, resources: WorkerResources) -> Self {
        self.resources = resources;
        self
    }
}

/// Descriptor addressing a reachable scheduler once a pool is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerEndpoint {
    pub address: String,
}

impl fmt::Display for SchedulerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// One submittable unit of search work: a single (parameter cell, fold)
/// evaluation.
///
/// Units are self-describing and serializable so a remote execution backend
/// can ship them to workers as-is; the local backend just moves them across
/// threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitUnit {
    /// Unique unit id.
    pub unit_id: Uuid,

    /// Search run this unit belongs to.
    pub search_id: Uuid,

    /// Grid cell sequence number (0-indexed).
    pub trial_number: usize,

    /// Cross-validation fold to hold out.
    pub fold: usize,

    /// Hyperparameters for this cell.
    pub parameters: HashMap<String, ParameterValue>,

    /// Seed handed to the forest fit.
    pub model_seed: u64,
}
