//! Loader configuration
//! Data directory and candidate workbook names, optionally read from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory searched for source workbooks, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Primary source, already close to the canonical schema.
pub const PRIMARY_DATA_FILENAME: &str = "결과물고도화.xlsx";
/// Older metadata workbook used when the primary source is absent.
pub const FALLBACK_META_FILENAME: &str = "agent6_final_db.xlsx";
/// Regression workbook name. Configured but never consulted by the loader.
pub const FALLBACK_REFERENCE_FILENAME: &str = "agent6_final_reg_db.xlsx";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Where the loader looks for data and how strict normalization is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub primary_filename: String,
    pub fallback_meta_filename: String,
    pub fallback_reference_filename: String,
    /// Fail instead of warning when no classification column can be resolved.
    pub require_img_type: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            primary_filename: PRIMARY_DATA_FILENAME.to_string(),
            fallback_meta_filename: FALLBACK_META_FILENAME.to_string(),
            fallback_reference_filename: FALLBACK_REFERENCE_FILENAME.to_string(),
            require_img_type: false,
        }
    }
}

impl DataConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Candidate source paths in priority order.
    pub fn candidate_paths(&self) -> [PathBuf; 2] {
        [
            self.data_dir.join(&self.primary_filename),
            self.data_dir.join(&self.fallback_meta_filename),
        ]
    }
}
