//! HTTP prediction service.
//!
//! The model artifact is loaded once at startup and shared read-only between
//! requests.
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

use diagnose_classifiers::artifact::ModelArtifact;

use super::handlers::{home, model_info, predict, AppState};
use super::input::ServeConfig;

pub fn build_router(artifact: Arc<ModelArtifact>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/model", get(model_info))
        .route("/predict", post(predict))
        .with_state(AppState { artifact })
}

pub fn load_model(path: &str) -> Result<Arc<ModelArtifact>> {
    let artifact = ModelArtifact::load(path)
        .with_context(|| format!("Failed to load model from {}", path))?;
    log::info!(
        "Model loaded from {} ({} features, classes {:?}, trained {})",
        path,
        artifact.feature_names.len(),
        artifact.classes(),
        artifact.trained_at
    );
    Ok(Arc::new(artifact))
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_listener<F>(
    listener: TcpListener,
    artifact: Arc<ModelArtifact>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, build_router(artifact))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;
    log::info!("Server on {} stopped", addr);
    Ok(())
}

pub async fn serve(config: &ServeConfig) -> Result<()> {
    let artifact = load_model(&config.model_path)?;
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    serve_with_listener(listener, artifact, shutdown_signal()).await
}

/// Blocking entry point used by the CLI.
pub fn run_server(config: &ServeConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(serve(config))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => log::error!("Failed to listen for shutdown signal: {}", e),
    }
}
