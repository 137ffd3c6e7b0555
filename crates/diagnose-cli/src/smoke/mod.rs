//! Smoke test client for a running prediction service.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::util::load_json_config;

/// Sample feature vectors in the 30-column breast-cancer layout.
pub const EXAMPLES: [[f64; 30]; 3] = [
    [
        14.5, 20.1, 90.3, 600.0, 0.1, 0.2, 0.3, 0.1, 0.25, 0.08, //
        0.3, 1.0, 2.0, 25.0, 0.01, 0.02, 0.02, 0.005, 0.02, 0.003, //
        12.0, 25.0, 80.0, 400.0, 0.15, 0.2, 0.1, 0.05, 0.3, 0.09,
    ],
    [
        20.0, 30.0, 140.0, 1000.0, 0.2, 0.3, 0.4, 0.2, 0.3, 0.1, //
        0.5, 2.0, 3.0, 40.0, 0.02, 0.03, 0.04, 0.01, 0.03, 0.01, //
        25.0, 35.0, 150.0, 1100.0, 0.25, 0.3, 0.15, 0.08, 0.35, 0.1,
    ],
    [
        13.5, 19.8, 85.0, 550.0, 0.09, 0.18, 0.28, 0.09, 0.23, 0.07, //
        0.28, 0.9, 1.9, 24.0, 0.009, 0.018, 0.019, 0.004, 0.018, 0.002, //
        11.5, 24.5, 78.0, 390.0, 0.14, 0.19, 0.11, 0.045, 0.28, 0.085,
    ],
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmokeConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        SmokeConfig {
            url: String::from("http://127.0.0.1:5000/predict"),
            timeout_secs: 10,
        }
    }
}

impl SmokeConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: SmokeConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => SmokeConfig::default(),
        };
        if let Some(url) = matches.get_one::<String>("url") {
            config.url = url.clone();
        }
        if let Some(timeout) = matches.get_one::<u64>("timeout") {
            config.timeout_secs = *timeout;
        }
        Ok(config)
    }
}

/// Response to one example request.
#[derive(Debug, Clone)]
pub struct SmokeResult {
    /// 1-based example number.
    pub example: usize,
    pub status: u16,
    pub prediction: Option<i64>,
    pub body: Value,
}

impl SmokeResult {
    pub fn summary_line(&self) -> String {
        let prediction = match self.prediction {
            Some(p) => p.to_string(),
            None => "None".to_string(),
        };
        format!(
            "Example {}: {{'prediction': {}}} - {}",
            self.example,
            prediction,
            class_name(self.prediction)
        )
    }
}

/// Label 1 is the malignant class, label 0 the benign one.
pub fn class_name(prediction: Option<i64>) -> &'static str {
    match prediction {
        Some(1) => "Malignant",
        Some(0) => "Benign",
        _ => "Unknown",
    }
}

/// Post every example to `config.url`. Error statuses are reported, not raised;
/// only transport failures abort the run.
pub fn run_smoke(config: &SmokeConfig) -> Result<Vec<SmokeResult>> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build();

    let mut results = Vec::with_capacity(EXAMPLES.len());
    for (idx, features) in EXAMPLES.iter().enumerate() {
        let payload = json!({ "features": features.to_vec() });
        let response = match agent.post(&config.url).send_json(payload) {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => return Err(anyhow!("Request to {} failed: {}", config.url, e)),
        };

        let status = response.status();
        let body: Value = response.into_json().unwrap_or(Value::Null);
        if status >= 400 {
            log::warn!("Example {} returned HTTP {}: {}", idx + 1, status, body);
        }
        results.push(SmokeResult {
            example: idx + 1,
            status,
            prediction: body.get("prediction").and_then(Value::as_i64),
            body,
        });
    }
    Ok(results)
}
