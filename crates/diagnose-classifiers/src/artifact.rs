//! Serialized model artifact: the fitted forest plus the metadata the
//! prediction service needs to validate requests.
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::ClassifierError;
use crate::math::Array2;
use crate::models::{ClassifierModel, RandomForest};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model: RandomForest,
    pub feature_names: Vec<String>,
    pub best_params: ForestParams,
    pub test_accuracy: Option<f64>,
    /// RFC 3339 timestamp.
    pub trained_at: String,
}

/// Outcome of a single-sample prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: i32,
    /// Aligned with the model's classes.
    pub probabilities: Vec<f64>,
}

impl ModelArtifact {
    pub fn new(model: RandomForest, feature_names: Vec<String>, test_accuracy: Option<f64>) -> Self {
        let best_params = *model.params();
        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            model,
            feature_names,
            best_params,
            test_accuracy,
            trained_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn n_features_in(&self) -> Option<usize> {
        self.model.n_features_in()
    }

    pub fn classes(&self) -> &[i32] {
        self.model.classes()
    }

    /// Validate one feature vector and predict its class.
    pub fn predict_one(&self, features: &[f32]) -> Result<Prediction, ClassifierError> {
        let expected = self.n_features_in().ok_or(ClassifierError::NotFitted)?;
        if features.len() != expected {
            return Err(ClassifierError::FeatureCountMismatch {
                expected,
                got: features.len(),
            });
        }
        if let Some(idx) = features.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature(idx));
        }

        let x = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| ClassifierError::InvalidParameter(e.to_string()))?;
        let proba = self.model.predict_proba(&x)?;
        let label = self.model.predict(&x)?[0];
        Ok(Prediction {
            label,
            probabilities: proba.row_slice(0).to_vec(),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string(self).context("Failed to serialize model artifact")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write model artifact: {}", path.display()))?;
        log::debug!("Wrote model artifact to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {}", path.display()))?;
        let artifact: ModelArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model artifact: {}", path.display()))?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            bail!(
                "Unsupported model artifact version {} (expected {})",
                artifact.format_version,
                ARTIFACT_FORMAT_VERSION
            );
        }
        if !artifact.model.is_fitted() {
            bail!("Model artifact {} contains an unfitted model", path.display());
        }
        if artifact.n_features_in() != Some(artifact.feature_names.len()) {
            bail!(
                "Model artifact {} lists {} feature names for a model fitted on {:?} features",
                path.display(),
                artifact.feature_names.len(),
                artifact.n_features_in()
            );
        }
        Ok(artifact)
    }
}
