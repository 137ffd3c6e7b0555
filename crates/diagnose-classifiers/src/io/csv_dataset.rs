//! CSV reader for labelled tabular data.
use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::data_handling::Dataset;
use crate::math::{Array1, Array2};

/// Configuration for reading a labelled CSV file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CsvReaderConfig {
    /// Column holding the class label.
    pub target_column: String,
    /// Categorical value mapped to label 1.
    pub positive_label: String,
    /// Categorical value mapped to label 0.
    pub negative_label: String,
    /// Columns removed when present. Columns with a blank header are always removed.
    pub drop_columns: Vec<String>,
    /// Field values treated as missing.
    pub missing_values: Vec<String>,
}

impl Default for CsvReaderConfig {
    fn default() -> Self {
        Self {
            target_column: "diagnosis".to_string(),
            positive_label: "M".to_string(),
            negative_label: "B".to_string(),
            drop_columns: vec!["id".to_string(), "Unnamed: 32".to_string()],
            missing_values: vec![
                "".to_string(),
                "NA".to_string(),
                "NaN".to_string(),
                "nan".to_string(),
                "null".to_string(),
            ],
        }
    }
}

/// Read a CSV file with the default configuration.
pub fn read_csv_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_csv_dataset_with_config(path, &CsvReaderConfig::default())
}

/// Read a CSV file into a dataset.
///
/// Exact duplicate rows are dropped first, then the configured columns, then
/// any row with a missing value (including a target value that is neither the
/// positive nor the negative label).
pub fn read_csv_dataset_with_config<P: AsRef<Path>>(
    path: P,
    config: &CsvReaderConfig,
) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open CSV file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();

    let target_idx = find_column(&headers, &config.target_column)
        .ok_or_else(|| anyhow!("Missing target column '{}'", config.target_column))?;

    let feature_indices = resolve_feature_indices(&headers, config, target_idx);
    if feature_indices.is_empty() {
        return Err(anyhow!("No feature columns detected in CSV header"));
    }

    let missing: HashSet<&str> = config.missing_values.iter().map(|s| s.as_str()).collect();
    let mut seen: HashSet<Vec<String>> = HashSet::new();

    // Rows with complete features, paired with their raw target value.
    let mut rows: Vec<(Vec<f32>, String)> = Vec::new();
    let mut categorical = false;
    let mut n_duplicates = 0usize;
    let mut n_incomplete = 0usize;

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let raw: Vec<String> = record.iter().map(|v| v.to_string()).collect();
        if !seen.insert(raw) {
            n_duplicates += 1;
            continue;
        }

        let target = record.get(target_idx).map(str::trim).unwrap_or("");
        let target_missing = missing.contains(target);
        if !target_missing && target.parse::<f64>().is_err() {
            categorical = true;
        }

        let mut row = Vec::with_capacity(feature_indices.len());
        let mut complete = !target_missing;
        for &idx in &feature_indices {
            let value = record.get(idx).map(str::trim).unwrap_or("");
            if missing.contains(value) {
                complete = false;
                continue;
            }
            let parsed = value.parse::<f32>().with_context(|| {
                format!(
                    "Invalid value '{}' for feature '{}' at row {}",
                    value,
                    headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            if !parsed.is_finite() {
                complete = false;
            }
            row.push(parsed);
        }
        if !complete {
            n_incomplete += 1;
            continue;
        }
        rows.push((row, target.to_string()));
    }

    let mut features = Vec::with_capacity(rows.len() * feature_indices.len());
    let mut labels = Vec::with_capacity(rows.len());
    for (row, target) in rows {
        match parse_label(&target, categorical, config) {
            Some(label) => {
                features.extend(row);
                labels.push(label);
            }
            None => n_incomplete += 1,
        }
    }

    if n_duplicates > 0 {
        log::debug!("Dropped {} duplicate rows", n_duplicates);
    }
    if n_incomplete > 0 {
        log::debug!("Dropped {} rows with missing values", n_incomplete);
    }
    if labels.is_empty() {
        return Err(anyhow!(
            "No usable rows in {} after preprocessing",
            path.as_ref().display()
        ));
    }

    let n_samples = labels.len();
    let n_features = feature_indices.len();
    let x = Array2::from_shape_vec((n_samples, n_features), features)
        .context("Failed to build feature matrix")?;
    let y = Array1::from_vec(labels);

    let feature_names = feature_indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").trim().to_string())
        .collect();

    Dataset::new(x, y, feature_names)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim() == name)
}

fn resolve_feature_indices(
    headers: &StringRecord,
    config: &CsvReaderConfig,
    target_idx: usize,
) -> Vec<usize> {
    let drop: HashSet<&str> = config.drop_columns.iter().map(|name| name.as_str()).collect();

    headers
        .iter()
        .enumerate()
        .filter(|(idx, header)| {
            let header = header.trim();
            *idx != target_idx && !header.is_empty() && !drop.contains(header)
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Map a non-missing target value to a class label.
///
/// A column holding any non-numeric value is categorical: only the positive
/// and negative labels map (to 1 and 0), everything else is missing. A purely
/// numeric column keeps its integer values.
fn parse_label(value: &str, categorical: bool, config: &CsvReaderConfig) -> Option<i32> {
    if categorical {
        return if value == config.positive_label {
            Some(1)
        } else if value == config.negative_label {
            Some(0)
        } else {
            None
        };
    }
    if let Ok(label) = value.parse::<i32>() {
        return Some(label);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.fract() == 0.0 && v.is_finite())
        .map(|v| v as i32)
}
