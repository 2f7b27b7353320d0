//! Schema Normalizer Module
//! Reconciles the known source workbook schemas into one canonical table.

use super::schema::{
    ColumnRule, Transform, COUNT_COLUMNS, ENG_RATE, ENG_RATE_RULES, FOLLOWERS, IMG_TYPE,
    IMG_TYPE_MAX, IMG_TYPE_MIN, IMG_TYPE_RULES,
};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No classification column found (expected img_type, main_type or image_type)")]
    MissingImgType,
}

/// Rewrites a raw table so every consumer sees the same logical columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaNormalizer {
    require_img_type: bool,
}

impl SchemaNormalizer {
    pub fn new(require_img_type: bool) -> Self {
        Self { require_img_type }
    }

    /// Standardize a raw table.
    ///
    /// Output columns: the input columns plus `img_type` (when resolvable),
    /// `eng_rate` and `followers`. Rows whose `img_type` is not a number in
    /// [1, 6] are dropped. Running this on its own output changes nothing.
    pub fn standardize(&self, raw: &DataFrame) -> Result<DataFrame, NormalizeError> {
        let mut df = raw.clone();

        // 1) classification column
        match resolve_rule(&df, IMG_TYPE_RULES)? {
            Some(rule) => {
                debug!(source = rule.sources[0], "resolved img_type column");
                apply_rule(&mut df, rule)?;
            }
            None if self.require_img_type => return Err(NormalizeError::MissingImgType),
            None => warn!("no img_type/main_type/image_type column, img_type filter skipped"),
        }

        // 2) likes/comments
        for name in COUNT_COLUMNS {
            if has_column(&df, name) {
                let numeric = to_numeric(df.column(name)?)?;
                df.with_column(numeric)?;
            }
        }

        // 3) engagement signal
        match resolve_rule(&df, ENG_RATE_RULES)? {
            Some(rule) => {
                debug!(sources = ?rule.sources, "resolved eng_rate column");
                apply_rule(&mut df, rule)?;
            }
            None if has_column(&df, ENG_RATE) => {
                let numeric = to_numeric(df.column(ENG_RATE)?)?;
                df.with_column(numeric)?;
            }
            None => {
                debug!("no engagement source, eng_rate left empty");
                let empty = Column::full_null(ENG_RATE.into(), df.height(), &DataType::Float64);
                df.with_column(empty)?;
            }
        }

        // 4) followers
        if !has_column(&df, FOLLOWERS) {
            let empty = Column::full_null(FOLLOWERS.into(), df.height(), &DataType::Float64);
            df.with_column(empty)?;
        }

        // 5) valid classification range
        if has_column(&df, IMG_TYPE) {
            let before = df.height();
            df = filter_img_type(df)?;
            if df.height() < before {
                debug!(dropped = before - df.height(), "dropped rows outside img_type range");
            }
        }

        Ok(df)
    }
}

pub(crate) fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|existing| existing.as_str() == name)
}

/// Numeric view of a column. Values that do not parse become null, and so does NaN.
pub fn to_numeric(column: &Column) -> PolarsResult<Column> {
    let values: Float64Chunked = match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_number))
            .collect(),
        _ => {
            let cast = column.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect()
        }
    };
    Ok(Column::from(values.with_name(column.name().clone()).into_series()))
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// First rule whose sources all exist (and hold values, when required).
fn resolve_rule<'a>(
    df: &DataFrame,
    rules: &'a [ColumnRule],
) -> PolarsResult<Option<&'a ColumnRule>> {
    for rule in rules {
        if !rule.sources.iter().all(|name| has_column(df, name)) {
            continue;
        }
        if rule.requires_values {
            let mut populated = true;
            for name in rule.sources {
                let numeric = to_numeric(df.column(name)?)?;
                if numeric.null_count() == numeric.len() {
                    populated = false;
                    break;
                }
            }
            if !populated {
                continue;
            }
        }
        return Ok(Some(rule));
    }
    Ok(None)
}

fn apply_rule(df: &mut DataFrame, rule: &ColumnRule) -> PolarsResult<()> {
    match rule.transform {
        Transform::Keep => {}
        Transform::Rename => {
            df.rename(rule.sources[0], rule.target.into())?;
        }
        Transform::Numeric => {
            let numeric = to_numeric(df.column(rule.sources[0])?)?;
            let values = numeric.f64()?.clone().with_name(rule.target.into());
            df.with_column(Column::from(values.into_series()))?;
        }
        Transform::SumFilled => {
            let mut total = vec![0.0_f64; df.height()];
            for name in rule.sources {
                let numeric = to_numeric(df.column(name)?)?;
                for (acc, v) in total.iter_mut().zip(numeric.f64()?.into_iter()) {
                    *acc += v.unwrap_or(0.0);
                }
            }
            df.with_column(Column::new(rule.target.into(), total))?;
        }
    }
    Ok(())
}

/// Coerce `img_type` to integers (truncating) and keep rows in the valid range.
fn filter_img_type(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let numeric = to_numeric(df.column(IMG_TYPE)?)?;
    let codes: Int64Chunked = numeric
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()).map(|x| x.trunc() as i64))
        .collect();
    df.with_column(Column::from(codes.with_name(IMG_TYPE.into()).into_series()))?;

    df.lazy()
        .filter(
            col(IMG_TYPE)
                .is_not_null()
                .and(col(IMG_TYPE).gt_eq(lit(IMG_TYPE_MIN)))
                .and(col(IMG_TYPE).lt_eq(lit(IMG_TYPE_MAX))),
        )
        .collect()
}
