use std::path::PathBuf;

use anyhow::{Context, Result};

use diagnose_classifiers::artifact::ModelArtifact;
use diagnose_classifiers::config::ForestParams;
use diagnose_classifiers::data_handling::{train_test_split, Dataset, Split};
use diagnose_classifiers::io::read_csv_dataset_with_config;
use diagnose_classifiers::models::ClassifierModel;
use diagnose_classifiers::search::RandomizedSearch;
use diagnose_classifiers::tracking::{ExperimentTracker, Run};

use super::input::TrainConfig;

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub best_params: ForestParams,
    pub cv_accuracy: f64,
    pub test_accuracy: f64,
    pub output_file: PathBuf,
    pub run_id: Option<String>,
}

pub fn run_training(config: &TrainConfig) -> Result<TrainingSummary> {
    let data = read_csv_dataset_with_config(&config.train_data, &config.reader)
        .with_context(|| format!("Failed to load training data: {}", config.train_data))?;
    data.log_summary();

    let split = train_test_split(&data, config.test_size, config.random_state)?;
    log::info!(
        "Split into {} training and {} test samples",
        split.train.n_samples(),
        split.test.n_samples()
    );

    let mut run = match &config.tracking {
        Some(tracking) => {
            Some(ExperimentTracker::new(&tracking.root, &tracking.experiment).start_run()?)
        }
        None => None,
    };

    match fit_and_save(config, &data, &split, run.as_mut()) {
        Ok(mut summary) => {
            if let Some(run) = run {
                summary.run_id = Some(run.id().to_string());
                run.finish()?;
            }
            Ok(summary)
        }
        Err(e) => {
            if let Some(run) = run {
                if let Err(close_err) = run.fail() {
                    log::warn!("Failed to mark run as failed: {:#}", close_err);
                }
            }
            Err(e)
        }
    }
}

fn fit_and_save(
    config: &TrainConfig,
    data: &Dataset,
    split: &Split,
    mut run: Option<&mut Run>,
) -> Result<TrainingSummary> {
    let outcome = RandomizedSearch::new(config.search.clone())
        .fit(&split.train.x, &split.train.y)
        .context("Hyper-parameter search failed")?;

    if let Some(run) = run.as_deref_mut() {
        run.log_params(&outcome.best_params)?;
    }

    let test_accuracy = outcome
        .best_model
        .score(&split.test.x, &split.test.y)
        .context("Failed to evaluate the model on the test split")?;
    log::info!("Test accuracy: {:.4}", test_accuracy);

    let output_file = PathBuf::from(&config.output_file);
    let artifact = ModelArtifact::new(
        outcome.best_model,
        data.feature_names.clone(),
        Some(test_accuracy),
    );
    artifact.save(&output_file)?;

    if let Some(run) = run {
        run.log_metric("accuracy", test_accuracy)?;
        run.log_metric("cv_accuracy", outcome.best_score)?;
        run.log_artifact(&output_file)?;
    }

    Ok(TrainingSummary {
        best_params: outcome.best_params,
        cv_accuracy: outcome.best_score,
        test_accuracy,
        output_file,
        run_id: None,
    })
}
