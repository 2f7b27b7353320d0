//! Explicit table cache
//! Holds the loaded tables for the lifetime of a dataset handle, together with
//! a stamp of the file they were read from.

use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Identity of a source file at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceStamp {
    /// Stamp the file as it is on disk now.
    pub fn capture(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedTable {
    table: DataFrame,
    stamp: SourceStamp,
}

/// Populated on first load and reused until invalidated.
#[derive(Debug, Default)]
pub struct TableCache {
    base: Option<CachedTable>,
    reference: Option<CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(&self) -> Option<&DataFrame> {
        self.base.as_ref().map(|cached| &cached.table)
    }

    pub fn reference(&self) -> Option<&DataFrame> {
        self.reference.as_ref().map(|cached| &cached.table)
    }

    /// Stamp of the source behind the cached base table.
    pub fn stamp(&self) -> Option<&SourceStamp> {
        self.base.as_ref().map(|cached| &cached.stamp)
    }

    pub fn store_base(&mut self, table: DataFrame, stamp: SourceStamp) {
        self.base = Some(CachedTable { table, stamp });
    }

    pub fn store_reference(&mut self, table: DataFrame, stamp: SourceStamp) {
        self.reference = Some(CachedTable { table, stamp });
    }

    pub fn is_populated(&self) -> bool {
        self.base.is_some() || self.reference.is_some()
    }

    /// Drop every cached table; the next load reads the source again.
    pub fn invalidate(&mut self) {
        self.base = None;
        self.reference = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn stamp() -> SourceStamp {
        SourceStamp {
            path: PathBuf::from("data/metrics.xlsx"),
            len: 42,
            modified: None,
        }
    }

    #[test]
    fn invalidate_clears_both_views() {
        let mut cache = TableCache::new();
        let table = df!("country" => ["KR"]).unwrap();
        cache.store_base(table.clone(), stamp());
        cache.store_reference(table, stamp());
        assert!(cache.is_populated());
        assert_eq!(cache.stamp(), Some(&stamp()));

        cache.invalidate();
        assert!(!cache.is_populated());
        assert!(cache.base().is_none());
        assert!(cache.reference().is_none());
        assert!(cache.stamp().is_none());
    }

    #[test]
    fn capture_reads_file_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        std::fs::write(&path, "country\nKR\n").unwrap();

        let stamp = SourceStamp::capture(&path).unwrap();
        assert_eq!(stamp.len, 11);
        assert_eq!(stamp.path, path);
    }
}
