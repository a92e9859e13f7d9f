//! K-fold cross-validation planning.

use serde::{Deserialize, Serialize};
use vt_types::{SelectorError, VtResult};

/// Contiguous, unshuffled k-fold partition of `rows` row indices.
///
/// Fold sizes follow the usual convention: the first `rows % k` folds take
/// one extra row. Validation folds are half-open index ranges; the training
/// side of fold `i` is everything outside its range. The plan is pure
/// bookkeeping, so the same (rows, k) pair always yields the same folds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFoldPlan {
    rows: usize,
    bounds: Vec<(usize, usize)>,
}

impl KFoldPlan {
    pub fn new(rows: usize, k: usize) -> VtResult<Self> {
        if k < 2 || k > rows {
            return Err(SelectorError::InvalidFoldCount { folds: k, rows }.into());
        }
        let base = rows / k;
        let extra = rows % k;
        let mut bounds = Vec::with_capacity(k);
        let mut start = 0;
        for i in 0..k {
            let len = base + usize::from(i < extra);
            bounds.push((start, start + len));
            start += len;
        }
        Ok(Self { rows, bounds })
    }

    pub fn k(&self) -> usize {
        self.bounds.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Half-open `[start, end)` validation range of one fold.
    pub fn validation_bounds(&self, fold: usize) -> (usize, usize) {
        self.bounds[fold]
    }

    /// Training row indices of one fold: everything outside its validation
    /// range, in ascending order.
    pub fn train_indices(&self, fold: usize) -> Vec<usize> {
        let (start, end) = self.bounds[fold];
        (0..start).chain(end..self.rows).collect()
    }
}
