use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info};
use vt_types::{DataError, Dataset, VtResult, WineSample, FEATURE_COUNT};

/// Expected number of fields per data line: eleven features plus the quality
/// label
pub const COLUMN_COUNT: usize = FEATURE_COUNT + 1;

/// Raw quality value known to be mislabeled in the source data
const MISLABELED_QUALITY: &str = "1";

/// Replacement applied to every occurrence of the mislabeled value
const CORRECTED_QUALITY: &str = "Excellent";

/// Load the wine quality dataset from a headerless, semicolon-separated CSV
/// file, naming its columns with `columns` (eleven feature names followed by
/// the label name).
///
/// Rows arrive in file order. The known bad quality value `"1"` is rewritten
/// to `"Excellent"` before the dataset is constructed; all other quality
/// strings pass through untouched. Any malformed line fails the whole load.
pub fn load_wine_csv<P: AsRef<Path>>(path: P, columns: &[String]) -> VtResult<Dataset> {
    let path = path.as_ref();
    info!("Loading wine dataset from {}", path.display());

    if columns.len() != COLUMN_COUNT {
        return Err(DataError::ColumnNameCount {
            found: columns.len(),
            expected: COLUMN_COUNT,
        }
        .into());
    }

    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| DataError::FileAccess {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let mut samples = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        // Headerless file: data starts at line 1
        let line = idx + 1;
        let record = result.map_err(|e| DataError::ParseError {
            line,
            message: e.to_string(),
        })?;
        samples.push(parse_record(&record, line)?);
    }

    let corrected = apply_quality_correction(&mut samples);
    if corrected > 0 {
        info!(
            "Relabeled {} quality value(s) '{}' -> '{}'",
            corrected, MISLABELED_QUALITY, CORRECTED_QUALITY
        );
    }

    info!("Loaded {} samples from {}", samples.len(), path.display());
    debug!("Columns: {:?}", columns);
    Ok(Dataset::new(columns.to_vec(), samples))
}

/// Parse one semicolon-separated record into a sample
fn parse_record(record: &csv::StringRecord, line: usize) -> VtResult<WineSample> {
    if record.len() != COLUMN_COUNT {
        return Err(DataError::ColumnCountMismatch {
            line,
            found: record.len(),
            expected: COLUMN_COUNT,
        }
        .into());
    }

    let mut features = [0.0f64; FEATURE_COUNT];
    for (idx, slot) in features.iter_mut().enumerate() {
        let raw = record.get(idx).unwrap_or("");
        *slot = raw.trim().parse::<f64>().map_err(|_| DataError::ParseError {
            line,
            message: format!("could not parse feature value '{}'", raw),
        })?;
    }

    let quality = record.get(FEATURE_COUNT).unwrap_or("").trim().to_string();
    if quality.is_empty() {
        return Err(DataError::ParseError {
            line,
            message: "empty quality label".to_string(),
        }
        .into());
    }

    Ok(WineSample::new(features, quality))
}

/// Rewrite the mislabeled quality value in place, returning how many rows
/// were touched
fn apply_quality_correction(samples: &mut [WineSample]) -> usize {
    let mut corrected = 0;
    for sample in samples.iter_mut() {
        if sample.quality == MISLABELED_QUALITY {
            sample.quality = CORRECTED_QUALITY.to_string();
            corrected += 1;
        }
    }
    corrected
}
