//! Data module - workbook loading and schema normalization

mod cache;
mod loader;
mod normalizer;
pub mod schema;
mod summary;
mod views;
mod workbook;

pub use cache::{SourceStamp, TableCache};
pub use loader::{resolve_source_path, ContentDataset, LoaderError};
pub use normalizer::{to_numeric, NormalizeError, SchemaNormalizer};
pub use summary::TableSummary;
pub use views::{get_countries, with_log_engagement};
pub use workbook::parse;
