//! Source file parsing
//! Turns the first worksheet of a workbook (or a CSV file) into a DataFrame,
//! keeping header names as they appear in the file.

use super::loader::LoaderError;
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Parse a source file into a raw DataFrame.
///
/// Any failure is returned as is; there is no partial result.
pub fn parse(path: &Path) -> Result<DataFrame, LoaderError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        read_spreadsheet(path)
    } else if extension == "csv" {
        read_csv(path)
    } else {
        Err(LoaderError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

fn read_spreadsheet(path: &Path) -> Result<DataFrame, LoaderError> {
    let parse_err = |source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(parse_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoaderError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(parse_err)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body.iter().map(|row| &row[idx]).collect();
            build_column(name.into(), &cells)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn read_csv(path: &Path) -> Result<DataFrame, LoaderError> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;
    Ok(df)
}

/// Header cells as column names: blanks become `Unnamed: {idx}` and repeats get
/// a `.1`, `.2`, ... suffix.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<String, usize> = HashMap::new();

    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell {
                Data::Empty => format!("Unnamed: {idx}"),
                Data::String(s) => s.clone(),
                other => other.to_string(),
            };

            let count = repeats.entry(base.clone()).or_insert(0);
            let mut name = base.clone();
            while used.contains(&name) {
                *count += 1;
                name = format!("{base}.{count}");
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

impl CellKind {
    fn of(cell: &Data) -> Option<Self> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::Int(_) => Some(CellKind::Int),
            Data::Float(_) => Some(CellKind::Float),
            Data::Bool(_) => Some(CellKind::Bool),
            _ => Some(CellKind::Text),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (CellKind::Int, CellKind::Float) | (CellKind::Float, CellKind::Int) => CellKind::Float,
            _ => CellKind::Text,
        }
    }
}

/// Pick the narrowest dtype that holds every non-empty cell of the column.
fn build_column(name: PlSmallStr, cells: &[&Data]) -> Column {
    let kind = cells
        .iter()
        .filter_map(|cell| CellKind::of(cell))
        .reduce(CellKind::merge);

    match kind {
        Some(CellKind::Int) => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        }
        Some(CellKind::Float) => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        }
        Some(CellKind::Bool) => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Column::new(name, values)
        }
        Some(CellKind::Text) => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty | Data::Error(_) => None,
                    Data::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name, values)
        }
        None => Column::full_null(name, cells.len(), &DataType::Float64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_repeated_headers_are_renamed() {
        let header = vec![
            Data::String("likes".to_string()),
            Data::Empty,
            Data::String("likes".to_string()),
            Data::String("likes".to_string()),
        ];
        assert_eq!(
            header_names(&header),
            vec!["likes", "Unnamed: 1", "likes.1", "likes.2"]
        );
    }

    #[test]
    fn repeated_header_skips_existing_suffix() {
        let header = vec![
            Data::String("a".to_string()),
            Data::String("a.1".to_string()),
            Data::String("a".to_string()),
        ];
        assert_eq!(header_names(&header), vec!["a", "a.1", "a.2"]);
    }

    #[test]
    fn mixed_numeric_cells_become_float() {
        let cells = [Data::Int(3), Data::Float(2.5), Data::Empty];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = build_column("likes".into(), &refs);

        assert_eq!(column.dtype(), &DataType::Float64);
        let values: Vec<Option<f64>> = column.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3.0), Some(2.5), None]);
    }

    #[test]
    fn text_in_numeric_column_keeps_text() {
        let cells = [Data::Float(10.0), Data::String("n/a".to_string())];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = build_column("likes".into(), &refs);

        assert_eq!(column.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = column.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("10"), Some("n/a")]);
    }

    #[test]
    fn empty_column_is_null_float() {
        let cells = [Data::Empty, Data::Empty];
        let refs: Vec<&Data> = cells.iter().collect();
        let column = build_column("followers".into(), &refs);

        assert_eq!(column.dtype(), &DataType::Float64);
        assert_eq!(column.null_count(), 2);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = parse(Path::new("metrics.txt")).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedFormat { .. }));
    }
}
