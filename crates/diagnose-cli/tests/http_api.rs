//! Router-level tests of the prediction service, plus an end-to-end run of
//! the smoke client against a live server.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use diagnose_classifiers::artifact::ModelArtifact;
use diagnose_classifiers::config::ForestParams;
use diagnose_classifiers::math::{Array1, Array2};
use diagnose_classifiers::models::{ClassifierModel, RandomForest};
use diagnose_cli::serve::server::{build_router, serve_with_listener};
use diagnose_cli::smoke::{run_smoke, SmokeConfig, EXAMPLES};

const N_FEATURES: usize = 30;

/// Forest over 30 features where benign rows sit near zero and malignant
/// rows are scaled up tenfold, roughly like the smoke-test examples.
fn artifact() -> Arc<ModelArtifact> {
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for i in 0..20 {
        let wobble = 0.9 + (i % 5) as f32 * 0.05;
        for (label, scale) in [(0, 1.0f32), (1, 3.0)] {
            for f in 0..N_FEATURES {
                data.push((f as f32 + 1.0) * scale * wobble);
            }
            labels.push(label);
        }
    }
    let x = Array2::from_shape_vec((labels.len(), N_FEATURES), data).unwrap();
    let y = Array1::from_vec(labels);
    let mut forest = RandomForest::new(ForestParams::new(15, None, 2), 42);
    forest.fit(&x, &y).unwrap();
    let names = (0..N_FEATURES).map(|f| format!("feature_{}", f)).collect();
    Arc::new(ModelArtifact::new(forest, names, Some(1.0)))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(artifact()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_predict(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn home_lists_endpoint() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "API ready. Endpoint POST /predict");
}

#[tokio::test]
async fn model_endpoint_describes_artifact() {
    let request = Request::builder().uri("/model").body(Body::empty()).unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_features"], 30);
    assert_eq!(body["classes"], json!([0, 1]));
    assert_eq!(body["best_params"]["n_estimators"], 15);
}

#[tokio::test]
async fn predict_without_content_type() {
    let features: Vec<f64> = (1..=30).map(|f| f as f64 * 3.0).collect();
    let payload = json!({ "features": features }).to_string();
    let (status, body) = send(post_predict(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], 1);
    let probabilities = body["probabilities"].as_array().unwrap();
    assert_eq!(probabilities.len(), 2);
    let total: f64 = probabilities.iter().map(|p| p.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn predict_rejects_bad_payloads() {
    let cases = [
        ("", "invalid JSON or empty body"),
        ("{\"features\": ", "invalid JSON or empty body"),
        ("{\"values\": [1]}", "missing key 'features' in JSON"),
        ("{\"features\": 3}", "'features' must be a list of numbers"),
        ("{\"features\": [1, 2]}", "expected 30 features, but received 2"),
    ];
    for (payload, message) in cases {
        let (status, body) = send(post_predict(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {:?}", payload);
        assert_eq!(body["error"], message, "payload {:?}", payload);
    }
}

#[tokio::test]
async fn predict_rejects_non_numeric_features() {
    let mut features: Vec<Value> = (0..30).map(|f| json!(f)).collect();
    features[4] = json!("large");
    let payload = json!({ "features": features }).to_string();
    let (status, body) = send(post_predict(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("ValueError:"));
}

#[tokio::test]
async fn get_on_predict_is_not_allowed() {
    let request = Request::builder().uri("/predict").body(Body::empty()).unwrap();
    let response = build_router(artifact()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn smoke_client_against_live_server() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_listener(listener, artifact(), async {
        let _ = stop_rx.await;
    }));

    let config = SmokeConfig {
        url: format!("http://{}/predict", addr),
        timeout_secs: 5,
    };
    let results = tokio::task::spawn_blocking(move || run_smoke(&config))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(results.len(), EXAMPLES.len());
    for result in &results {
        assert_eq!(result.status, 200, "body: {}", result.body);
        assert!(matches!(result.prediction, Some(0) | Some(1)));
        assert!(result.summary_line().starts_with(&format!("Example {}:", result.example)));
    }

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
