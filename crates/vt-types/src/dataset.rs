use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of physicochemical feature columns in every sample
pub const FEATURE_COUNT: usize = 11;

/// A single wine sample: eleven physicochemical measurements plus the raw
/// quality label as it appeared in the source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WineSample {
    pub fixed_acidity: f64,
    pub volatile_acidity: f64,
    pub citric_acid: f64,
    pub residual_sugar: f64,
    pub chlorides: f64,
    pub free_sulfur_dioxide: f64,
    pub total_sulfur_dioxide: f64,
    pub density: f64,
    pub ph: f64,
    pub sulphates: f64,
    pub alcohol: f64,
    pub quality: String,
}

impl WineSample {
    pub fn new(features: [f64; FEATURE_COUNT], quality: String) -> Self {
        let [fixed_acidity, volatile_acidity, citric_acid, residual_sugar, chlorides, free_sulfur_dioxide, total_sulfur_dioxide, density, ph, sulphates, alcohol] =
            features;
        Self {
            fixed_acidity,
            volatile_acidity,
            citric_acid,
            residual_sugar,
            chlorides,
            free_sulfur_dioxide,
            total_sulfur_dioxide,
            density,
            ph,
            sulphates,
            alcohol,
            quality,
        }
    }

    /// Feature values in fixed column order
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.fixed_acidity,
            self.volatile_acidity,
            self.citric_acid,
            self.residual_sugar,
            self.chlorides,
            self.free_sulfur_dioxide,
            self.total_sulfur_dioxide,
            self.density,
            self.ph,
            self.sulphates,
            self.alcohol,
        ]
    }
}

/// An ordered collection of wine samples together with the column names they
/// were loaded under. Rows are fixed once the dataset is constructed; the
/// loader applies its label correction before it builds one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    samples: Vec<WineSample>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, samples: Vec<WineSample>) -> Self {
        Self { columns, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Column names in file order: eleven feature names then the label name
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn samples(&self) -> &[WineSample] {
        &self.samples
    }

    /// Per-feature summary statistics over all rows
    pub fn summary(&self) -> DatasetSummary {
        let mut features = Vec::with_capacity(FEATURE_COUNT);
        for idx in 0..FEATURE_COUNT {
            let name = self
                .columns
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("feature_{}", idx));
            let values: Vec<f64> = self.samples.iter().map(|s| s.features()[idx]).collect();
            features.push(FeatureSummary::from_values(name, &values));
        }
        DatasetSummary {
            rows: self.samples.len(),
            features,
        }
    }
}

/// Summary statistics for one feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub name: String,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl FeatureSummary {
    fn from_values(name: String, values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                name,
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        // Sample standard deviation (n - 1 denominator)
        let std_dev = if values.len() > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
            var.sqrt()
        } else {
            0.0
        };
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self {
            name,
            mean,
            std_dev,
            min,
            max,
        }
    }
}

/// Human-readable dataset description: row count plus one statistics row per
/// feature column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub features: Vec<FeatureSummary>,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .features
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(0)
            .max("feature".len());
        writeln!(
            f,
            "{:>width$}  {:>8}  {:>10}  {:>10}  {:>10}  {:>10}",
            "feature",
            "count",
            "mean",
            "std",
            "min",
            "max",
            width = name_width
        )?;
        for s in &self.features {
            writeln!(
                f,
                "{:>width$}  {:>8}  {:>10.4}  {:>10.4}  {:>10.4}  {:>10.4}",
                s.name,
                self.rows,
                s.mean,
                s.std_dev,
                s.min,
                s.max,
                width = name_width
            )?;
        }
        Ok(())
    }
}
