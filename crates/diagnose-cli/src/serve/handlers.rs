//! Request handlers of the prediction service.
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use diagnose_classifiers::artifact::ModelArtifact;
use diagnose_classifiers::config::ForestParams;
use diagnose_classifiers::error::ClassifierError;

/// Shared state for the handlers.
#[derive(Clone)]
pub struct AppState {
    pub artifact: Arc<ModelArtifact>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub prediction: i32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub probabilities: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub features: Vec<String>,
    pub n_features: Option<usize>,
    pub classes: Vec<i32>,
    pub best_params: ForestParams,
    pub test_accuracy: Option<f64>,
    pub trained_at: String,
}

/// Error rendered as `{"error": message}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Internal server error: {}", message),
        }
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        if matches!(err, ClassifierError::FeatureCountMismatch { .. }) {
            ApiError::bad_request(err.to_string())
        } else if err.is_input_error() {
            ApiError::bad_request(format!("ValueError: {}", err))
        } else {
            ApiError::internal(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn home() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "message": "API ready. Endpoint POST /predict" })),
    )
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    let artifact = &state.artifact;
    Json(ModelInfo {
        features: artifact.feature_names.clone(),
        n_features: artifact.n_features_in(),
        classes: artifact.classes().to_vec(),
        best_params: artifact.best_params,
        test_accuracy: artifact.test_accuracy,
        trained_at: artifact.trained_at.clone(),
    })
}

/// `POST /predict`. The body is read as JSON whatever its content type.
pub async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    match predict_from_body(&state.artifact, &body) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            log::error!("{}", err.message);
            err.into_response()
        }
    }
}

pub fn predict_from_body(artifact: &ModelArtifact, body: &[u8]) -> Result<PredictResponse, ApiError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::bad_request("invalid JSON or empty body"))?;
    if payload.is_null() {
        return Err(ApiError::bad_request("invalid JSON or empty body"));
    }

    let features = payload
        .get("features")
        .ok_or_else(|| ApiError::bad_request("missing key 'features' in JSON"))?;
    let values = features
        .as_array()
        .ok_or_else(|| ApiError::bad_request("'features' must be a list of numbers"))?;

    if let Some(expected) = artifact.n_features_in() {
        if values.len() != expected {
            return Err(ClassifierError::FeatureCountMismatch {
                expected,
                got: values.len(),
            }
            .into());
        }
    }

    let features = parse_features(values)?;
    log::info!("Received request with features: {:?}", features);

    let prediction = artifact.predict_one(&features)?;
    let response = PredictResponse {
        prediction: prediction.label,
        probabilities: prediction.probabilities,
    };
    log::info!(
        "Prediction: {}",
        serde_json::to_string(&response).unwrap_or_default()
    );
    Ok(response)
}

fn parse_features(values: &[Value]) -> Result<Vec<f32>, ApiError> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            let number = value.as_f64().ok_or_else(|| {
                ApiError::bad_request(format!(
                    "ValueError: could not convert feature at position {} ({}) to float",
                    idx, value
                ))
            })?;
            if !number.is_finite() {
                return Err(ClassifierError::NonFiniteFeature(idx).into());
            }
            // Split thresholds lie within the f32 range, so saturating keeps the
            // decision of every node unchanged.
            Ok(number.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32)
        })
        .collect()
}
