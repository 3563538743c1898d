//! Serializable run configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one pipeline run. Every field has a default, so a
/// partial TOML file (or none at all) works.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory watched for raw execution exports.
    pub input_dir: PathBuf,

    /// Archive subdirectory name, created under the directory being drained.
    pub archive_subdir: String,

    /// Directory where stage 1 writes staged trades CSVs for stage 2.
    pub staging_dir: PathBuf,

    /// Path of the persistent journal workbook.
    pub journal_path: PathBuf,

    /// Sheet the import stage appends to.
    pub sheet_name: String,

    /// JSON file mapping instrument symbol to contract multiplier.
    pub multipliers_path: PathBuf,

    /// When set, logs are also written to daily-rotated files here.
    pub log_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            archive_subdir: "Archive".to_string(),
            staging_dir: PathBuf::from("staging"),
            journal_path: PathBuf::from("TradingJournal.json"),
            sheet_name: "CurrentMonth".to_string(),
            multipliers_path: PathBuf::from("instrument_multipliers.json"),
            log_dir: None,
        }
    }
}

impl RunnerConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Archive directory for processed raw exports.
    pub fn input_archive_dir(&self) -> PathBuf {
        self.input_dir.join(&self.archive_subdir)
    }

    /// Archive directory for imported staged files.
    pub fn staging_archive_dir(&self) -> PathBuf {
        self.staging_dir.join(&self.archive_subdir)
    }
}
