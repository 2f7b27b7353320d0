//! Content Data Loader Module
//! Finds the source workbook, parses and standardizes it, and caches the result.

use super::cache::{SourceStamp, TableCache};
use super::normalizer::{NormalizeError, SchemaNormalizer};
use super::views::with_log_engagement;
use super::workbook::parse;
use crate::config::DataConfig;
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(
        "Data file not found in {}: place '{primary}' or '{fallback}' there",
        .dir.display()
    )]
    DataNotFound {
        dir: PathBuf,
        primary: String,
        fallback: String,
    },
    #[error("Failed to read workbook {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("Workbook {} has no worksheets", .path.display())]
    EmptyWorkbook { path: PathBuf },
    #[error("Unsupported source format: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("Failed to stat {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Missing column: {0}")]
    MissingColumn(&'static str),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// First existing candidate, primary before fallback.
pub fn resolve_source_path(config: &DataConfig) -> Result<PathBuf, LoaderError> {
    config
        .candidate_paths()
        .into_iter()
        .find(|path| path.is_file())
        .ok_or_else(|| LoaderError::DataNotFound {
            dir: config.data_dir.clone(),
            primary: config.primary_filename.clone(),
            fallback: config.fallback_meta_filename.clone(),
        })
}

/// Handle to the content metrics table.
///
/// Each view is read from disk once and served from the cache afterwards.
pub struct ContentDataset {
    config: DataConfig,
    normalizer: SchemaNormalizer,
    cache: TableCache,
}

impl ContentDataset {
    pub fn new(config: DataConfig, cache: TableCache) -> Self {
        let normalizer = SchemaNormalizer::new(config.require_img_type);
        Self {
            config,
            normalizer,
            cache,
        }
    }

    pub fn with_config(config: DataConfig) -> Self {
        Self::new(config, TableCache::new())
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TableCache {
        &mut self.cache
    }

    pub fn resolve_source_path(&self) -> Result<PathBuf, LoaderError> {
        resolve_source_path(&self.config)
    }

    /// Standardized table from the highest-priority source file.
    pub fn load_base_table(&mut self) -> Result<DataFrame, LoaderError> {
        if let Some(table) = self.cache.base() {
            debug!("base table served from cache");
            return Ok(table.clone());
        }

        let path = self.resolve_source_path()?;
        info!(path = %path.display(), "loading content metrics");

        let stamp = SourceStamp::capture(&path).map_err(|source| LoaderError::Io {
            path: path.clone(),
            source,
        })?;
        let raw = parse(&path)?;
        let table = self.normalizer.standardize(&raw)?;
        info!(
            raw_rows = raw.height(),
            rows = table.height(),
            columns = table.width(),
            "content metrics loaded"
        );

        self.cache.store_base(table.clone(), stamp);
        Ok(table)
    }

    /// Base table with the `log_eng` column used for distribution views.
    pub fn load_reference_table(&mut self) -> Result<DataFrame, LoaderError> {
        if let Some(table) = self.cache.reference() {
            debug!("reference table served from cache");
            return Ok(table.clone());
        }

        let base = self.load_base_table()?;
        let table = with_log_engagement(&base)?;
        if let Some(stamp) = self.cache.stamp().cloned() {
            self.cache.store_reference(table.clone(), stamp);
        }
        Ok(table)
    }

    /// Same table as [`ContentDataset::load_base_table`].
    pub fn load_meta_table(&mut self) -> Result<DataFrame, LoaderError> {
        self.load_base_table()
    }

    /// Invalidate the cache if the source on disk no longer matches what was
    /// loaded: another candidate now wins, or the file changed or vanished.
    ///
    /// Returns true when the cache was dropped.
    pub fn refresh_if_stale(&mut self) -> bool {
        let Some(loaded) = self.cache.stamp() else {
            return false;
        };

        let current = self
            .resolve_source_path()
            .ok()
            .and_then(|path| SourceStamp::capture(&path).ok());

        if current.as_ref() == Some(loaded) {
            return false;
        }

        info!(path = %loaded.path.display(), "source changed, dropping cached tables");
        self.cache.invalidate();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sources_name_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::with_data_dir(dir.path());

        let err = resolve_source_path(&config).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, LoaderError::DataNotFound { .. }));
        assert!(message.contains("결과물고도화.xlsx"));
        assert!(message.contains("agent6_final_db.xlsx"));
        assert!(!message.contains("agent6_final_reg_db.xlsx"));
    }

    #[test]
    fn primary_wins_over_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::with_data_dir(dir.path());
        std::fs::write(dir.path().join(&config.fallback_meta_filename), b"x").unwrap();
        assert_eq!(
            resolve_source_path(&config).unwrap(),
            dir.path().join("agent6_final_db.xlsx")
        );

        std::fs::write(dir.path().join(&config.primary_filename), b"x").unwrap();
        assert_eq!(
            resolve_source_path(&config).unwrap(),
            dir.path().join("결과물고도화.xlsx")
        );
    }

    #[test]
    fn reference_workbook_is_never_used() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::with_data_dir(dir.path());
        std::fs::write(dir.path().join(&config.fallback_reference_filename), b"x").unwrap();

        assert!(resolve_source_path(&config).is_err());
    }

    #[test]
    fn corrupt_workbook_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::with_data_dir(dir.path());
        std::fs::write(dir.path().join(&config.primary_filename), b"not a zip").unwrap();

        let mut dataset = ContentDataset::with_config(config);
        let err = dataset.load_base_table().unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
        assert!(!dataset.cache().is_populated());
    }

    #[test]
    fn refresh_without_cache_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = ContentDataset::with_config(DataConfig::with_data_dir(dir.path()));
        assert!(!dataset.refresh_if_stale());
    }
}
