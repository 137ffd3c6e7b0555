// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Writes a CSV in the breast-cancer layout with `n_features` feature columns.
/// Malignant rows are shifted upwards on every feature.
pub fn write_dataset(dir: &Path, n_per_class: usize, n_features: usize) -> PathBuf {
    let mut csv = String::from("id,diagnosis");
    for f in 0..n_features {
        write!(csv, ",feature_{}", f).unwrap();
    }
    csv.push_str(",\n");

    for i in 0..n_per_class {
        for (label, offset) in [("B", 0.0f32), ("M", 10.0)] {
            write!(csv, "{}{},{}", label, i, label).unwrap();
            for f in 0..n_features {
                let value = offset + ((i * 7 + f * 3) % 11) as f32 * 0.25;
                write!(csv, ",{:.3}", value).unwrap();
            }
            csv.push_str(",\n");
        }
    }

    let path = dir.join("data.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

/// Training config with a tiny search space so the tests stay fast.
pub fn write_quick_config(dir: &Path, tracking_root: Option<&Path>) -> PathBuf {
    let tracking = match tracking_root {
        Some(root) => serde_json::json!({ "root": root, "experiment": "test-experiment" }),
        None => serde_json::Value::Null,
    };
    let config = serde_json::json!({
        "search": {
            "space": {
                "n_estimators": [5, 10],
                "max_depth": [3, null],
                "min_samples_split": [2]
            },
            "n_iter": 2,
            "cv": 3
        },
        "tracking": tracking
    });
    let path = dir.join("train.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}
