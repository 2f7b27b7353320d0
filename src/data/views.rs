//! Derived views over the standardized table.

use super::loader::LoaderError;
use super::normalizer::{has_column, to_numeric};
use super::schema::{COUNTRY, ENG_RATE, LOG_ENG};
use polars::prelude::*;
use std::collections::BTreeSet;

/// Base table plus `log_eng = ln(1 + eng_rate)`.
///
/// Null engagement stays null, as does any value where the log is undefined.
pub fn with_log_engagement(base: &DataFrame) -> Result<DataFrame, LoaderError> {
    if !has_column(base, ENG_RATE) {
        return Err(LoaderError::MissingColumn(ENG_RATE));
    }

    let eng = to_numeric(base.column(ENG_RATE)?)?;
    let log_eng: Float64Chunked = eng
        .f64()?
        .into_iter()
        .map(|v| v.map(f64::ln_1p).filter(|x| !x.is_nan()))
        .collect();

    let mut df = base.clone();
    df.with_column(Column::from(log_eng.with_name(LOG_ENG.into()).into_series()))?;
    Ok(df)
}

/// Distinct non-null `country` values in ascending order.
pub fn get_countries(table: &DataFrame) -> Result<Vec<String>, LoaderError> {
    if !has_column(table, COUNTRY) {
        return Err(LoaderError::MissingColumn(COUNTRY));
    }

    let countries = table.column(COUNTRY)?.cast(&DataType::String)?;
    let unique: BTreeSet<String> = countries
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    Ok(unique.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_eng_follows_eng_rate() {
        let base = df!("eng_rate" => [Some(0.0), Some(15.0), None, Some(-3.0)]).unwrap();
        let out = with_log_engagement(&base).unwrap();

        let log_eng: Vec<Option<f64>> = out.column(LOG_ENG).unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(log_eng[0], Some(0.0));
        assert!((log_eng[1].unwrap() - 16.0_f64.ln()).abs() < 1e-12);
        assert_eq!(log_eng[2], None);
        assert_eq!(log_eng[3], None);
    }

    #[test]
    fn log_eng_requires_eng_rate() {
        let base = df!("likes" => [1.0]).unwrap();
        let err = with_log_engagement(&base).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn("eng_rate")));
    }

    #[test]
    fn countries_are_sorted_and_unique() {
        let table = df!("country" => [Some("US"), Some("KR"), None, Some("JP"), Some("KR")]).unwrap();
        assert_eq!(get_countries(&table).unwrap(), vec!["JP", "KR", "US"]);
    }

    #[test]
    fn numeric_country_codes_are_rendered_as_text() {
        let table = df!("country" => [82i64, 1, 82]).unwrap();
        assert_eq!(get_countries(&table).unwrap(), vec!["1", "82"]);
    }

    #[test]
    fn countries_need_country_column() {
        let table = df!("likes" => [1.0]).unwrap();
        assert!(matches!(
            get_countries(&table),
            Err(LoaderError::MissingColumn("country"))
        ));
    }
}
