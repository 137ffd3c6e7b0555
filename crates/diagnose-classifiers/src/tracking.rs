//! File-based experiment tracking.
//!
//! Runs are stored as `<root>/<experiment>/<run_id>/` with `params.json`,
//! `metrics.json`, `meta.json` and an `artifacts/` directory.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ExperimentTracker {
    root: PathBuf,
    experiment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// An open run. Parameters and metrics are flushed on every call.
#[derive(Debug)]
pub struct Run {
    dir: PathBuf,
    meta: RunMeta,
    params: BTreeMap<String, serde_json::Value>,
    metrics: BTreeMap<String, f64>,
}

impl ExperimentTracker {
    pub fn new<P: AsRef<Path>>(root: P, experiment: &str) -> Self {
        ExperimentTracker {
            root: root.as_ref().to_path_buf(),
            experiment: experiment.to_string(),
        }
    }

    pub fn experiment_dir(&self) -> PathBuf {
        self.root.join(&self.experiment)
    }

    pub fn start_run(&self) -> Result<Run> {
        let start_time = Utc::now();
        let base_id = start_time.format("%Y%m%dT%H%M%S%.3fZ").to_string();

        let experiment_dir = self.experiment_dir();
        let mut run_id = base_id.clone();
        let mut suffix = 1;
        while experiment_dir.join(&run_id).exists() {
            run_id = format!("{}-{}", base_id, suffix);
            suffix += 1;
        }

        let dir = experiment_dir.join(&run_id);
        fs::create_dir_all(dir.join("artifacts"))
            .with_context(|| format!("Failed to create run directory: {}", dir.display()))?;

        let run = Run {
            dir,
            meta: RunMeta {
                run_id,
                experiment: self.experiment.clone(),
                status: RunStatus::Running,
                start_time,
                end_time: None,
            },
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
        };
        run.write_json("meta.json", &run.meta)?;
        log::info!(
            "Started run {} in experiment '{}'",
            run.meta.run_id,
            self.experiment
        );
        Ok(run)
    }
}

impl Run {
    pub fn id(&self) -> &str {
        &self.meta.run_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record every field of a serializable struct as a parameter.
    pub fn log_params<T: Serialize>(&mut self, params: &T) -> Result<()> {
        let value = serde_json::to_value(params).context("Failed to serialize run parameters")?;
        match value {
            serde_json::Value::Object(map) => self.params.extend(map),
            other => {
                self.params.insert("value".to_string(), other);
            }
        }
        self.write_json("params.json", &self.params)
    }

    pub fn log_metric(&mut self, name: &str, value: f64) -> Result<()> {
        self.metrics.insert(name.to_string(), value);
        self.write_json("metrics.json", &self.metrics)
    }

    /// Copy a file into the run's `artifacts/` directory.
    pub fn log_artifact<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .with_context(|| format!("Artifact path has no file name: {}", path.display()))?;
        let dest = self.dir.join("artifacts").join(file_name);
        fs::copy(path, &dest)
            .with_context(|| format!("Failed to copy artifact {}", path.display()))?;
        Ok(dest)
    }

    pub fn finish(self) -> Result<RunMeta> {
        self.close(RunStatus::Finished)
    }

    pub fn fail(self) -> Result<RunMeta> {
        self.close(RunStatus::Failed)
    }

    fn close(mut self, status: RunStatus) -> Result<RunMeta> {
        self.meta.status = status;
        self.meta.end_time = Some(Utc::now());
        self.write_json("meta.json", &self.meta)?;
        log::debug!("Closed run {} as {:?}", self.meta.run_id, status);
        Ok(self.meta)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", name))?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForestParams;

    #[test]
    fn run_writes_params_metrics_and_meta() {
        let root = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::new(root.path(), "demo");
        let mut run = tracker.start_run().unwrap();
        let dir = run.dir().to_path_buf();

        run.log_params(&ForestParams::new(50, Some(3), 2)).unwrap();
        run.log_metric("accuracy", 0.95).unwrap();

        let artifact = root.path().join("model.json");
        fs::write(&artifact, "{}").unwrap();
        let copied = run.log_artifact(&artifact).unwrap();
        assert!(copied.exists());

        let meta = run.finish().unwrap();
        assert_eq!(meta.status, RunStatus::Finished);
        assert!(meta.end_time.is_some());

        let params: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("params.json")).unwrap()).unwrap();
        assert_eq!(params["n_estimators"], 50);
        assert_eq!(params["max_depth"], 3);

        let metrics: BTreeMap<String, f64> =
            serde_json::from_str(&fs::read_to_string(dir.join("metrics.json")).unwrap()).unwrap();
        assert_eq!(metrics["accuracy"], 0.95);

        let stored: RunMeta =
            serde_json::from_str(&fs::read_to_string(dir.join("meta.json")).unwrap()).unwrap();
        assert_eq!(stored.status, RunStatus::Finished);
        assert_eq!(stored.experiment, "demo");
    }

    #[test]
    fn concurrent_run_ids_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::new(root.path(), "demo");
        let a = tracker.start_run().unwrap();
        let b = tracker.start_run().unwrap();
        assert_ne!(a.id(), b.id());
    }
}
