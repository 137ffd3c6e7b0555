use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use crate::util::load_json_config;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServeConfig {
    pub model_path: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            model_path: String::from("model.json"),
            host: String::from("0.0.0.0"),
            port: 5000,
        }
    }
}

impl ServeConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config: ServeConfig = match config_path {
            Some(path) => load_json_config(path)?,
            None => ServeConfig::default(),
        };

        if let Some(model_path) = matches.get_one::<String>("model_path") {
            config.model_path = model_path.clone();
        }
        if let Some(host) = matches.get_one::<String>("host") {
            config.host = host.clone();
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            config.port = *port;
        }

        Ok(config)
    }
}
