//! Application configuration
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables and finally by command-line flags.

use recordchain_records::NumericPolicy;
use recordchain_workflow::WorkflowConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides `data_dir`
pub const DATA_DIR_ENV: &str = "RECORDCHAIN_DATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the journal
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Journal file name inside `data_dir`
    #[serde(default = "default_journal_file")]
    pub journal_file: String,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub numeric: NumericPolicy,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_journal_file() -> String {
    "ledger.jsonl".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            journal_file: default_journal_file(),
            workflow: WorkflowConfig::default(),
            numeric: NumericPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `RECORDCHAIN_DATA` if set
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(&self.journal_file)
    }
}
