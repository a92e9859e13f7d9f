//! Search space definitions and parameter sweep strategies.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameter name for the number of trees in the forest.
pub const PARAM_N_TREES: &str = "n_trees";
/// Parameter name for the maximum tree depth.
pub const PARAM_MAX_DEPTH: &str = "max_depth";
/// Parameter name for the per-split feature policy ("sqrt", "log2", "all").
pub const PARAM_MAX_FEATURES: &str = "max_features";

/// A single parameter dimension in the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable parameter name (e.g. "n_trees").
    pub name: String,
    /// The kind of search range.
    pub kind: ParameterKind,
}

/// Describes the values a parameter can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Stepped half-open integer range: `low`, `low + step`, ... strictly
    /// below `high`.
    IntRange { low: i64, high: i64, step: i64 },
    /// Categorical choices.
    Choice { values: Vec<serde_json::Value> },
}

impl ParameterKind {
    /// Number of grid points on this axis; 0 when the range is empty or the
    /// step is not positive.
    fn axis_len(&self) -> usize {
        match self {
            ParameterKind::IntRange { low, high, step } => {
                if *step <= 0 || high <= low {
                    0
                } else {
                    ((high - low + step - 1) / step) as usize
                }
            }
            ParameterKind::Choice { values } => values.len(),
        }
    }

    /// The concrete grid values on this axis, in order.
    fn axis_values(&self) -> Vec<ParameterValue> {
        match self {
            ParameterKind::IntRange { low, high, step } => {
                let mut values = Vec::new();
                if *step > 0 {
                    let mut v = *low;
                    while v < *high {
                        values.push(ParameterValue::Int(v));
                        v += step;
                    }
                }
                values
            }
            ParameterKind::Choice { values } => values
                .iter()
                .map(|v| ParameterValue::Json(v.clone()))
                .collect(),
        }
    }
}

/// A concrete parameter value produced by a search strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Int(i64),
    Json(serde_json::Value),
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// The full search space: an ordered list of parameter definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub parameters: Vec<ParameterDef>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
        }
    }

    /// Add a stepped half-open integer range `[low, high)`.
    pub fn add_int_range(mut self, name: impl Into<String>, low: i64, high: i64, step: i64) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParameterKind::IntRange { low, high, step },
        });
        self
    }

    pub fn add_choice(mut self, name: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            kind: ParameterKind::Choice { values },
        });
        self
    }

    /// Total number of grid cells (`None` on overflow).
    pub fn grid_size(&self) -> Option<usize> {
        let mut total: usize = 1;
        for param in &self.parameters {
            total = total.checked_mul(param.kind.axis_len())?;
        }
        Some(total)
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Search strategies
// ---------------------------------------------------------------------------

/// Common trait for all search strategies.
pub trait SearchStrategy: Send + Sync {
    /// Generate the next batch of parameter combinations to evaluate. An
    /// empty batch means the strategy is exhausted.
    fn suggest(&mut self, count: usize) -> Vec<HashMap<String, ParameterValue>>;

    /// Report completed trial results so adaptive strategies can learn.
    fn report(&mut self, _params: &HashMap<String, ParameterValue>, _objective: f64) {}

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

// ---- Grid search ----

/// Exhaustive sweep over every cell of the discrete grid, in axis-major
/// order: later parameters vary fastest.
#[derive(Debug, Clone)]
pub struct GridSearch {
    cursor: usize,
    combos: Vec<HashMap<String, ParameterValue>>,
}

impl GridSearch {
    pub fn new(space: SearchSpace) -> Self {
        let combos = Self::build_grid(&space);
        Self { cursor: 0, combos }
    }

    /// Cells remaining to be suggested.
    pub fn remaining(&self) -> usize {
        self.combos.len() - self.cursor
    }

    fn build_grid(space: &SearchSpace) -> Vec<HashMap<String, ParameterValue>> {
        let mut axes: Vec<Vec<(&str, ParameterValue)>> = Vec::new();
        for param in &space.parameters {
            axes.push(
                param
                    .kind
                    .axis_values()
                    .into_iter()
                    .map(|v| (param.name.as_str(), v))
                    .collect(),
            );
        }

        // Cartesian product
        let mut result: Vec<HashMap<String, ParameterValue>> = vec![HashMap::new()];
        for axis in &axes {
            let mut next = Vec::with_capacity(result.len() * axis.len());
            for existing in &result {
                for (name, value) in axis {
                    let mut combo = existing.clone();
                    combo.insert(name.to_string(), value.clone());
                    next.push(combo);
                }
            }
            result = next;
        }
        result
    }
}

impl SearchStrategy for GridSearch {
    fn suggest(&mut self, count: usize) -> Vec<HashMap<String, ParameterValue>> {
        let end = (self.cursor + count).min(self.combos.len());
        let batch = self.combos[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }

    fn name(&self) -> &str {
        "grid"
    }
}

// ---- Random search ----

/// Seeded random sampling of grid lattice points, so runs stay reproducible.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: SearchSpace,
    rng: ChaCha8Rng,
}

impl RandomSearch {
    pub fn new(space: SearchSpace, seed: u64) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn sample_one(&mut self) -> HashMap<String, ParameterValue> {
        let mut params = HashMap::new();
        for param in &self.space.parameters {
            let value = match &param.kind {
                ParameterKind::IntRange { low, step, .. } => {
                    // Draw a lattice index so samples respect the step
                    let len = param.kind.axis_len().max(1);
                    let idx = self.rng.gen_range(0..len) as i64;
                    ParameterValue::Int(low + idx * step)
                }
                ParameterKind::Choice { values } => {
                    let idx = self.rng.gen_range(0..values.len());
                    ParameterValue::Json(values[idx].clone())
                }
            };
            params.insert(param.name.clone(), value);
        }
        params
    }
}

impl SearchStrategy for RandomSearch {
    fn suggest(&mut self, count: usize) -> Vec<HashMap<String, ParameterValue>> {
        (0..count).map(|_| self.sample_one()).collect()
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_space() -> SearchSpace {
        SearchSpace::new()
            .add_int_range(PARAM_N_TREES, 10, 200, 5)
            .add_int_range(PARAM_MAX_DEPTH, 3, 30, 2)
    }

    #[test]
    fn test_wine_grid_has_532_cells() {
        // 38 tree counts x 14 depths
        let space = sample_space();
        assert_eq!(space.grid_size(), Some(532));

        let mut gs = GridSearch::new(space);
        let batch = gs.suggest(1000);
        assert_eq!(batch.len(), 532);
    }

    #[test]
    fn test_half_open_ranges_exclude_high() {
        let space = SearchSpace::new().add_int_range("x", 10, 200, 5);
        let mut gs = GridSearch::new(space);
        let combos = gs.suggest(100);

        assert_eq!(combos.len(), 38);
        assert_eq!(combos[0].get("x"), Some(&ParameterValue::Int(10)));
        assert_eq!(combos[37].get("x"), Some(&ParameterValue::Int(195)));
        assert!(!combos.iter().any(|c| c.get("x") == Some(&ParameterValue::Int(200))));
    }

    #[test]
    fn test_grid_cursor_advances() {
        let space = SearchSpace::new().add_int_range("x", 0, 5, 1); // 5 values
        let mut gs = GridSearch::new(space);

        let first = gs.suggest(3);
        assert_eq!(first.len(), 3);
        assert_eq!(gs.remaining(), 2);

        let second = gs.suggest(10);
        assert_eq!(second.len(), 2);
        assert!(gs.suggest(10).is_empty());
    }

    #[test]
    fn test_grid_order_is_deterministic() {
        let mut a = GridSearch::new(sample_space());
        let mut b = GridSearch::new(sample_space());

        assert_eq!(a.suggest(600), b.suggest(600));
    }

    #[test]
    fn test_empty_axis_empties_the_grid() {
        let space = SearchSpace::new()
            .add_int_range("x", 5, 5, 1)
            .add_int_range("y", 0, 10, 1);

        assert_eq!(space.grid_size(), Some(0));
        let mut gs = GridSearch::new(space);
        assert!(gs.suggest(10).is_empty());
    }

    #[test]
    fn test_non_positive_step_empties_the_axis() {
        let space = SearchSpace::new().add_int_range("x", 0, 10, 0);

        assert_eq!(space.grid_size(), Some(0));
    }

    #[test]
    fn test_random_search_stays_on_the_lattice() {
        let mut rs = RandomSearch::new(sample_space(), 30);
        let suggestions = rs.suggest(50);
        assert_eq!(suggestions.len(), 50);

        for params in &suggestions {
            match params.get(PARAM_N_TREES) {
                Some(ParameterValue::Int(v)) => {
                    assert!(*v >= 10 && *v < 200);
                    assert_eq!((*v - 10) % 5, 0);
                }
                other => panic!("unexpected n_trees value: {other:?}"),
            }
        }
    }

    #[test]
    fn test_random_search_is_seeded() {
        let mut a = RandomSearch::new(sample_space(), 7);
        let mut b = RandomSearch::new(sample_space(), 7);

        assert_eq!(a.suggest(20), b.suggest(20));
    }

    #[test]
    fn test_choice_parameter_samples_from_the_set() {
        let space = SearchSpace::new().add_choice(
            PARAM_MAX_FEATURES,
            vec![
                serde_json::json!("sqrt"),
                serde_json::json!("log2"),
                serde_json::json!("all"),
            ],
        );
        let mut rs = RandomSearch::new(space, 1);
        for params in rs.suggest(30) {
            match params.get(PARAM_MAX_FEATURES) {
                Some(ParameterValue::Json(v)) => {
                    let s = v.as_str().unwrap();
                    assert!(["sqrt", "log2", "all"].contains(&s));
                }
                other => panic!("unexpected max_features value: {other:?}"),
            }
        }
    }

    #[test]
    fn test_choice_axis_joins_the_grid() {
        let space = SearchSpace::new()
            .add_int_range(PARAM_N_TREES, 10, 20, 5) // 2 values
            .add_choice(
                PARAM_MAX_FEATURES,
                vec![serde_json::json!("sqrt"), serde_json::json!("all")],
            );

        assert_eq!(space.grid_size(), Some(4));
        let mut gs = GridSearch::new(space);
        assert_eq!(gs.suggest(10).len(), 4);
    }
}
