use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the three inputs; outputs are written here too.
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
            log_to_file: true,
        }
    }
}

impl Config {
    /// Defaults, then `pipeline.toml` if present, then environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = Self::from_file_if_present(Path::new(constants::CONFIG_FILE))?;
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file_if_present(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Applies `PIPELINE_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PIPELINE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PIPELINE_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("PIPELINE_LOG_TO_FILE") {
            self.log_to_file = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(PipelineError::Config(format!(
                        "PIPELINE_LOG_TO_FILE must be a boolean, got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(self)
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(constants::OUTPUT_FILE)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(constants::RESTAURANTS_DB_FILE)
    }
}
