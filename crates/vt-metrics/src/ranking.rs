use std::cmp::Ordering;
use std::collections::BTreeSet;
use vt_types::{ClassId, MetricsError, VtResult};

/// Fraction of positions where truth and prediction agree
pub fn accuracy(y_true: &[ClassId], y_pred: &[ClassId]) -> VtResult<f64> {
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            truths: y_true.len(),
            predictions: y_pred.len(),
        }
        .into());
    }
    if y_true.is_empty() {
        return Err(MetricsError::EmptyPredictions.into());
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Area under the ROC curve via the Mann-Whitney rank statistic, with
/// midranks for tied scores.
///
/// `y_true` must contain exactly two distinct classes; the greater class code
/// is treated as the positive one. Anything else is an explicit error, never
/// a silent default.
pub fn roc_auc(y_true: &[ClassId], scores: &[f64]) -> VtResult<f64> {
    let positive = binary_positive_class(y_true, scores)?;

    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    // 1-based midranks over ascending scores
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let midrank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = midrank;
        }
        i = j + 1;
    }

    let n_pos = y_true.iter().filter(|&&t| t == positive).count();
    let n_neg = n - n_pos;
    let rank_sum: f64 = (0..n)
        .filter(|&i| y_true[i] == positive)
        .map(|i| ranks[i])
        .sum();

    let auc = (rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0) / (n_pos * n_neg) as f64;
    Ok(auc)
}

/// Average precision: the step-function sum over recall increments,
/// descending the score-thresholded ranking.
///
/// Shares the binary contract of [`roc_auc`]: exactly two observed classes,
/// the greater code positive.
pub fn average_precision(y_true: &[ClassId], scores: &[f64]) -> VtResult<f64> {
    let positive = binary_positive_class(y_true, scores)?;

    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let total_pos = y_true.iter().filter(|&&t| t == positive).count() as f64;

    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut ap = 0.0;
    let mut prev_recall = 0.0;

    // Tied scores form one threshold block
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        for k in i..=j {
            if y_true[order[k]] == positive {
                tp += 1;
            } else {
                fp += 1;
            }
        }
        let precision = tp as f64 / (tp + fp) as f64;
        let recall = tp as f64 / total_pos;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
        i = j + 1;
    }
    Ok(ap)
}

/// Validate the binary-metric contract and return the positive class code
fn binary_positive_class(y_true: &[ClassId], scores: &[f64]) -> VtResult<ClassId> {
    if y_true.len() != scores.len() {
        return Err(MetricsError::LengthMismatch {
            truths: y_true.len(),
            predictions: scores.len(),
        }
        .into());
    }
    if y_true.is_empty() {
        return Err(MetricsError::EmptyPredictions.into());
    }
    let distinct: BTreeSet<ClassId> = y_true.iter().copied().collect();
    if distinct.len() != 2 {
        return Err(MetricsError::NonBinaryLabels {
            found: distinct.len(),
        }
        .into());
    }
    distinct
        .into_iter()
        .next_back()
        .ok_or_else(|| MetricsError::EmptyPredictions.into())
}
