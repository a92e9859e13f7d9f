use tracing::debug;
use vt_types::{Dataset, LabelMap, LabeledDataset, VtResult};

/// Encode every row of `dataset` through the shared label map, producing the
/// feature matrix and integer label vector the models consume.
///
/// The caller fits one map over the full dataset and reuses it for every
/// partition, so train and test always agree on the category/code bijection.
pub fn encode_labels(dataset: &Dataset, map: &LabelMap) -> VtResult<LabeledDataset> {
    let mut features = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());

    for sample in dataset.samples() {
        features.push(sample.features());
        labels.push(map.encode(&sample.quality)?);
    }

    debug!(
        "Encoded {} rows over {} classes",
        labels.len(),
        map.n_classes()
    );
    LabeledDataset::new(features, labels)
}
