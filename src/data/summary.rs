//! Table summary for operators: what was loaded and how it breaks down.

use super::loader::LoaderError;
use super::normalizer::has_column;
use super::schema::{ENG_RATE, IMG_TYPE};
use super::views::get_countries;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub source: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    pub countries: Vec<String>,
    /// Rows per classification code; empty when the table has no `img_type`.
    pub img_type_counts: BTreeMap<i64, usize>,
    pub eng_rate_missing: usize,
}

impl TableSummary {
    pub fn from_table(source: PathBuf, table: &DataFrame) -> Result<Self, LoaderError> {
        let columns = table
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let countries = match get_countries(table) {
            Ok(countries) => countries,
            Err(LoaderError::MissingColumn(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let mut img_type_counts = BTreeMap::new();
        if has_column(table, IMG_TYPE) {
            let codes = table.column(IMG_TYPE)?.cast(&DataType::Int64)?;
            for code in codes.i64()?.into_iter().flatten() {
                *img_type_counts.entry(code).or_insert(0) += 1;
            }
        }

        let eng_rate_missing = if has_column(table, ENG_RATE) {
            table.column(ENG_RATE)?.null_count()
        } else {
            table.height()
        };

        Ok(Self {
            source,
            rows: table.height(),
            columns,
            countries,
            img_type_counts,
            eng_rate_missing,
        })
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source:    {}", self.source.display())?;
        writeln!(f, "rows:      {}", self.rows)?;
        writeln!(f, "columns:   {}", self.columns.join(", "))?;
        writeln!(f, "countries: {}", self.countries.join(", "))?;
        if self.img_type_counts.is_empty() {
            writeln!(f, "img_type:  (no classification column)")?;
        } else {
            let counts: Vec<String> = self
                .img_type_counts
                .iter()
                .map(|(code, n)| format!("{code}={n}"))
                .collect();
            writeln!(f, "img_type:  {}", counts.join(" "))?;
        }
        write!(f, "eng_rate missing: {}", self.eng_rate_missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_types_and_missing_engagement() {
        let table = df!(
            "img_type" => [1i64, 3, 3, 6],
            "eng_rate" => [Some(1.0), None, Some(2.0), None],
            "country" => ["KR", "US", "KR", "JP"]
        )
        .unwrap();

        let summary = TableSummary::from_table(PathBuf::from("data/x.xlsx"), &table).unwrap();
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.countries, vec!["JP", "KR", "US"]);
        assert_eq!(summary.img_type_counts, BTreeMap::from([(1, 1), (3, 2), (6, 1)]));
        assert_eq!(summary.eng_rate_missing, 2);

        let text = summary.to_string();
        assert!(text.contains("img_type:  1=1 3=2 6=1"));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows"], 4);
        assert_eq!(json["img_type_counts"]["3"], 2);
    }

    #[test]
    fn tolerates_missing_country_and_type() {
        let table = df!("likes" => [1.0, 2.0]).unwrap();
        let summary = TableSummary::from_table(PathBuf::from("x.csv"), &table).unwrap();
        assert!(summary.countries.is_empty());
        assert!(summary.img_type_counts.is_empty());
        assert_eq!(summary.eng_rate_missing, 2);
    }
}
