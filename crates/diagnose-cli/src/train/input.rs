use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use diagnose_classifiers::config::SearchConfig;
use diagnose_classifiers::io::CsvReaderConfig;

use crate::util::{load_json_config, validate_csv_file};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackingConfig {
    /// Directory holding one sub-directory per experiment.
    pub root: String,
    pub experiment: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            root: String::from("runs"),
            experiment: String::from("breast-cancer-experiment"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub train_data: String,
    pub output_file: String,
    /// Fraction of rows held out for the final evaluation.
    pub test_size: f64,
    /// Seed of the train/test shuffle.
    pub random_state: u64,
    pub reader: CsvReaderConfig,
    pub search: SearchConfig,
    /// `None` disables run tracking.
    pub tracking: Option<TrackingConfig>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::from("data.csv"),
            output_file: String::from("model.json"),
            test_size: 0.2,
            random_state: 42,
            reader: CsvReaderConfig::default(),
            search: SearchConfig::default(),
            tracking: Some(TrackingConfig::default()),
        }
    }
}

impl TrainConfig {
    /// Load the optional config file, then apply command-line overrides.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: TrainConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => {
                log::info!("No config file provided; using default training configuration.");
                TrainConfig::default()
            }
        };

        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        validate_csv_file(&config.train_data)?;

        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }

        if let Some(n_iter) = matches.get_one::<usize>("n_iter") {
            config.search.n_iter = *n_iter;
        }

        if let Some(cv) = matches.get_one::<usize>("cv") {
            config.search.cv = *cv;
        }

        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.random_state = *seed;
            config.search.random_state = *seed;
        }

        if matches.get_flag("no_tracking") {
            config.tracking = None;
        }

        Ok(config)
    }
}
