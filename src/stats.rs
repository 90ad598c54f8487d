//! Aggregate statistics over the cleaned observation table.
//!
//! These helpers consume the eight-column frame produced by
//! [`crate::WeatherCleaner::restructure`]; they never mutate their input.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("column '{0}' is not present in the table")]
    MissingColumn(String),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Loads a previously saved observation table from CSV.
pub fn load_csv(path: &Path) -> Result<DataFrame, StatsError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Computes mean, median, and sample standard deviation of `value` per
/// city for one weather variable.
///
/// The result has one row per city with columns `by`, `mean`, `median`,
/// and `std`, sorted by city name. Cities with a single observation get a
/// missing `std`.
///
/// # Errors
///
/// Returns [`StatsError::MissingColumn`] when `by`, `variable`, or `value`
/// is absent (e.g. when the table was never restructured).
pub fn city_summary(df: &DataFrame, variable: &str) -> Result<DataFrame, StatsError> {
    require_columns(df, &["by", "variable", "value"])?;
    let summary = df
        .clone()
        .lazy()
        .filter(col("variable").eq(lit(variable)))
        .group_by([col("by")])
        .agg([
            col("value").mean().alias("mean"),
            col("value").median().alias("median"),
            col("value").std(1).alias("std"),
        ])
        .sort(["by"], Default::default())
        .collect()?;
    Ok(summary)
}

/// Pearson correlation between two weather variables, joined on
/// observation date, optionally restricted to one city.
///
/// Returns `Ok(None)` when fewer than two overlapping dates exist or when
/// either variable has zero variance over the overlap.
pub fn correlation(
    df: &DataFrame,
    var_a: &str,
    var_b: &str,
    city: Option<&str>,
) -> Result<Option<f64>, StatsError> {
    require_columns(df, &["referenceTime", "variable", "value"])?;
    if city.is_some() {
        require_columns(df, &["by"])?;
    }

    let mut base = df.clone().lazy();
    if let Some(city) = city {
        base = base.filter(col("by").eq(lit(city)));
    }
    let left = base
        .clone()
        .filter(col("variable").eq(lit(var_a)))
        .select([col("referenceTime"), col("value").alias("value_a")]);
    let right = base
        .filter(col("variable").eq(lit(var_b)))
        .select([col("referenceTime"), col("value").alias("value_b")]);
    let joined = left
        .inner_join(right, col("referenceTime"), col("referenceTime"))
        .collect()?;

    let a = joined.column("value_a")?.cast(&DataType::Float64)?;
    let a = a.f64()?;
    let b = joined.column("value_b")?.cast(&DataType::Float64)?;
    let b = b.f64()?;
    let pairs: Vec<(f64, f64)> = a
        .into_iter()
        .zip(b)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();
    Ok(pearson(&pairs))
}

fn require_columns(df: &DataFrame, names: &[&str]) -> Result<(), StatsError> {
    for name in names {
        if df.column(name).is_err() {
            return Err(StatsError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPERATURE: &str = "air_temperature P1D";
    const WIND: &str = "wind_speed P1D";

    fn cleaned_frame() -> DataFrame {
        df!(
            "by" => ["Oslo", "Oslo", "Bergen", "Oslo", "Oslo"],
            "referenceTime" => ["2022-01-01", "2022-01-02", "2022-01-01", "2022-01-01", "2022-01-02"],
            "variable" => [TEMPERATURE, TEMPERATURE, TEMPERATURE, WIND, WIND],
            "value" => [0.0, 2.0, 5.0, 0.0, 4.0],
        )
        .unwrap()
    }

    #[test]
    fn city_summary_aggregates_per_city() {
        let summary = city_summary(&cleaned_frame(), TEMPERATURE).unwrap();

        assert_eq!(summary.height(), 2);
        let cities = summary.column("by").unwrap().str().unwrap();
        assert_eq!(cities.get(0), Some("Bergen"));
        assert_eq!(cities.get(1), Some("Oslo"));

        let means = summary.column("mean").unwrap().f64().unwrap();
        assert_eq!(means.get(0), Some(5.0));
        assert_eq!(means.get(1), Some(1.0));

        // A single observation leaves the sample std undefined.
        let stds = summary.column("std").unwrap().f64().unwrap();
        assert_eq!(stds.get(0), None);
        assert!((stds.get(1).unwrap() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn city_summary_requires_the_cleaned_layout() {
        let raw = df!("value" => [1.0]).unwrap();
        let err = city_summary(&raw, TEMPERATURE).unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(_)));
    }

    #[test]
    fn correlation_of_linearly_related_variables_is_one() {
        // Oslo temperature [0, 2] and wind [0, 4] on the same two days.
        let r = correlation(&cleaned_frame(), TEMPERATURE, WIND, Some("Oslo"))
            .unwrap()
            .unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_without_overlap_is_none() {
        let df = df!(
            "referenceTime" => ["2022-01-01", "2022-06-01"],
            "variable" => [TEMPERATURE, WIND],
            "value" => [1.0, 2.0],
        )
        .unwrap();

        let r = correlation(&df, TEMPERATURE, WIND, None).unwrap();
        assert_eq!(r, None);
    }

    #[test]
    fn correlation_with_constant_variable_is_none() {
        let df = df!(
            "referenceTime" => ["2022-01-01", "2022-01-02", "2022-01-01", "2022-01-02"],
            "variable" => [TEMPERATURE, TEMPERATURE, WIND, WIND],
            "value" => [3.0, 3.0, 1.0, 2.0],
        )
        .unwrap();

        let r = correlation(&df, TEMPERATURE, WIND, None).unwrap();
        assert_eq!(r, None);
    }
}
