//! AP.Signal - content performance metrics loader
//!
//! Loads the content metrics workbook, reconciles the known source schemas into
//! one table and serves derived views to the dashboard.

pub mod config;
pub mod data;

pub use config::{ConfigError, DataConfig};
pub use data::{
    get_countries, parse, resolve_source_path, ContentDataset, LoaderError, NormalizeError,
    SchemaNormalizer, TableCache, TableSummary,
};
