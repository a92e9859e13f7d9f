use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use vt_types::{DataError, LabeledDataset, TrainTestSplit, VtResult};

/// Partition `data` into disjoint train and test sets.
///
/// The test set takes `ceil(rows * test_fraction)` rows, chosen by shuffling
/// row indices with a ChaCha8 generator seeded from `seed`. The same inputs
/// always produce byte-identical partitions; within each partition rows keep
/// their shuffled order.
pub fn train_test_split(
    data: &LabeledDataset,
    test_fraction: f64,
    seed: u64,
) -> VtResult<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidTestFraction {
            fraction: test_fraction,
        }
        .into());
    }
    if data.is_empty() {
        return Err(DataError::EmptyDataset.into());
    }

    let rows = data.len();
    let test_rows = ((rows as f64) * test_fraction).ceil() as usize;
    if test_rows == 0 || test_rows >= rows {
        return Err(DataError::DegenerateSplit {
            rows,
            fraction: test_fraction,
        }
        .into());
    }

    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(test_rows);
    let train = data.select(train_idx);
    let test = data.select(test_idx);

    debug!(
        "Split {} rows into {} train / {} test (seed {})",
        rows,
        train.len(),
        test.len(),
        seed
    );
    Ok(TrainTestSplit {
        train,
        test,
        test_fraction,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vt_types::FEATURE_COUNT;

    /// Rows whose first feature doubles as a unique row id
    fn numbered_rows(n: usize) -> LabeledDataset {
        let features = (0..n)
            .map(|i| {
                let mut row = [0.0; FEATURE_COUNT];
                row[0] = i as f64;
                row
            })
            .collect();
        let labels = (0..n).map(|i| (i % 2) as u32).collect();
        LabeledDataset::new(features, labels).unwrap()
    }

    fn row_ids(data: &LabeledDataset) -> BTreeSet<usize> {
        data.features.iter().map(|row| row[0] as usize).collect()
    }

    #[test]
    fn test_split_sizes_use_ceiling() {
        let data = numbered_rows(1599);
        let split = train_test_split(&data, 0.2, 30).unwrap();

        // ceil(1599 * 0.2) = 320
        assert_eq!(split.test.len(), 320);
        assert_eq!(split.train.len(), 1279);
    }

    #[test]
    fn test_partitions_are_disjoint_and_cover_all_rows() {
        let data = numbered_rows(50);
        let split = train_test_split(&data, 0.2, 30).unwrap();

        let train_ids = row_ids(&split.train);
        let test_ids = row_ids(&split.test);

        assert_eq!(train_ids.len(), split.train.len());
        assert_eq!(test_ids.len(), split.test.len());
        assert!(train_ids.is_disjoint(&test_ids));

        let mut all: BTreeSet<usize> = train_ids;
        all.extend(test_ids);
        assert_eq!(all, (0..50).collect());
    }

    #[test]
    fn test_same_seed_reproduces_the_split() {
        let data = numbered_rows(100);

        let first = train_test_split(&data, 0.2, 30).unwrap();
        let second = train_test_split(&data, 0.2, 30).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let data = numbered_rows(100);

        let a = train_test_split(&data, 0.2, 30).unwrap();
        let b = train_test_split(&data, 0.2, 31).unwrap();

        assert_ne!(row_ids(&a.test), row_ids(&b.test));
    }

    #[test]
    fn test_labels_travel_with_their_rows() {
        let data = numbered_rows(40);
        let split = train_test_split(&data, 0.25, 7).unwrap();

        for (row, label) in split.train.features.iter().zip(&split.train.labels) {
            assert_eq!(*label, (row[0] as u32) % 2);
        }
        for (row, label) in split.test.features.iter().zip(&split.test.labels) {
            assert_eq!(*label, (row[0] as u32) % 2);
        }
    }

    #[test]
    fn test_invalid_fractions_are_rejected() {
        let data = numbered_rows(10);

        assert!(train_test_split(&data, 0.0, 1).is_err());
        assert!(train_test_split(&data, 1.0, 1).is_err());
        assert!(train_test_split(&data, -0.5, 1).is_err());
        assert!(train_test_split(&data, f64::NAN, 1).is_err());
    }

    #[test]
    fn test_degenerate_split_is_rejected() {
        // ceil(1 * 0.5) = 1 would leave no training rows
        let data = numbered_rows(1);

        assert!(train_test_split(&data, 0.5, 1).is_err());
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let data = LabeledDataset::new(vec![], vec![]).unwrap();

        assert!(train_test_split(&data, 0.2, 30).is_err());
    }
}
