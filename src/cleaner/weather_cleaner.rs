//! Cleans and reshapes one table of raw Frost observations.

use crate::cleaner::error::CleanError;
use crate::registry::CityRegistry;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{info, warn};
use ordered_float::OrderedFloat;
use polars::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// The cleaned column set, in output order.
const CLEAN_COLUMNS: [&str; 8] = [
    "by",
    "sourceId",
    "referenceTime",
    "statistikk",
    "variable",
    "value",
    "unit",
    "codequality",
];

/// Matches element ids of the form `<statistic>(<variable>`,
/// e.g. `mean(air_temperature P1D)`.
const ELEMENT_ID_PATTERN: &str = r"(\w+)\(([^)]+)";

/// The daily mean air temperature element, as named by the Frost API.
const COLD_DAY_VARIABLE: &str = "air_temperature P1D";

/// Owns one observation table and the city registry used to enrich it.
///
/// Every cleaning operation mutates the owned `DataFrame` in place and
/// returns a reference to it, so call order matters: `restructure` derives
/// the columns that `cold_days` and the statistics helpers rely on. The
/// cleaner never hands out a second mutable handle to the table.
///
/// A typical run:
///
/// 1. [`fill_missing_quality`](Self::fill_missing_quality)
/// 2. [`restructure`](Self::restructure)
/// 3. [`classify_quality`](Self::classify_quality)
/// 4. [`save_csv`](Self::save_csv)
pub struct WeatherCleaner {
    df: DataFrame,
    registry: CityRegistry,
}

impl WeatherCleaner {
    pub fn new(df: DataFrame, registry: CityRegistry) -> Self {
        Self { df, registry }
    }

    /// The table in its current shape.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Consumes the cleaner, handing the table to downstream consumers.
    pub fn into_frame(self) -> DataFrame {
        self.df
    }

    /// Replaces every missing `codequality` value with the column's mode.
    ///
    /// Ties between equally frequent codes break toward the smallest value.
    /// A table without a `codequality` column is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::NoQualityData`] when the column exists but has
    /// no non-missing values, leaving the mode undefined.
    pub fn fill_missing_quality(&mut self) -> Result<&DataFrame, CleanError> {
        let Ok(column) = self.df.column("codequality") else {
            return Ok(&self.df);
        };
        let values = column.cast(&DataType::Float64)?;
        let values = values.f64()?;
        if values.is_empty() || values.null_count() == values.len() {
            return Err(CleanError::NoQualityData);
        }

        let mut counts: HashMap<OrderedFloat<f64>, usize> = HashMap::new();
        for value in values.into_iter().flatten() {
            *counts.entry(OrderedFloat(value)).or_insert(0) += 1;
        }
        let mode = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(value, _)| value.into_inner())
            .ok_or(CleanError::NoQualityData)?;

        let filled: Float64Chunked = values.into_iter().map(|v| v.or(Some(mode))).collect();
        self.df
            .with_column(filled.with_name("codequality".into()).into_series())?;
        Ok(&self.df)
    }

    /// Counts missing values per column, zero counts included.
    pub fn missing_value_counts(&self) -> HashMap<String, usize> {
        self.df
            .get_columns()
            .iter()
            .map(|column| (column.name().to_string(), column.null_count()))
            .collect()
    }

    /// Reshapes the raw table into the cleaned eight-column layout.
    ///
    /// Truncates `referenceTime` to calendar dates, splits `elementId`
    /// into `statistikk` and `variable` (non-matching ids leave both
    /// missing), derives `by` from `sourceId` via the registry (unmapped
    /// station codes leave it missing), and selects exactly the cleaned
    /// columns in order, dropping everything else.
    ///
    /// # Errors
    ///
    /// Propagates a polars error when one of the expected raw columns
    /// (`referenceTime`, `elementId`, `sourceId`, `value`, `unit`,
    /// `codequality`) is absent or has an unexpected type.
    pub fn restructure(&mut self) -> Result<&DataFrame, CleanError> {
        let dates = self.truncated_dates()?;
        let (statistikk, variable) = self.split_element_ids()?;
        let cities = self.mapped_cities()?;

        self.df.with_column(dates)?;
        self.df.with_column(statistikk)?;
        self.df.with_column(variable)?;
        self.df.with_column(cities)?;
        self.df = self.df.select(CLEAN_COLUMNS)?;
        Ok(&self.df)
    }

    /// Buckets the numeric `codequality` column into category labels.
    ///
    /// Codes 0–2 become `"Good"`, 3–5 `"Medium"`, any other non-missing
    /// value `"Poor"`; missing entries stay missing. A table without the
    /// column is left untouched, with a diagnostic.
    pub fn classify_quality(&mut self) -> Result<&DataFrame, CleanError> {
        let Ok(column) = self.df.column("codequality") else {
            warn!("the codequality column is not present; nothing to classify");
            return Ok(&self.df);
        };
        let values = column.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let categories: StringChunked = values.into_iter().map(|v| v.map(category_label)).collect();
        self.df
            .with_column(categories.with_name("codequality".into()).into_series())?;
        Ok(&self.df)
    }

    /// Writes the table to `path` as CSV (header row, no index column).
    ///
    /// Best-effort: a confirmation is logged on success and a diagnostic on
    /// failure, but the call never propagates an error — the in-memory
    /// table stays valid either way.
    pub fn save_csv(&mut self, path: &Path) {
        let file = match File::create(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("could not save data to {}: {e}", path.display());
                return;
            }
        };
        match CsvWriter::new(file).include_header(true).finish(&mut self.df) {
            Ok(()) => info!("data saved to {}", path.display()),
            Err(e) => warn!("could not save data to {}: {e}", path.display()),
        }
    }

    /// Selects the rows where the daily mean air temperature is below zero.
    ///
    /// Input relative order is preserved. A table lacking the `variable` or
    /// `value` column yields an empty frame and a diagnostic instead of an
    /// error.
    pub fn cold_days(&self) -> Result<DataFrame, CleanError> {
        if self.df.column("variable").is_err() || self.df.column("value").is_err() {
            warn!("the table lacks the variable or value column; no cold days to select");
            return Ok(DataFrame::empty());
        }
        let variables = self.df.column("variable")?.str()?;
        let values = self.df.column("value")?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let variable_mask = variables.equal(COLD_DAY_VARIABLE);
        let value_mask = values.lt(0.0);
        let cold = self.df.filter(&(&variable_mask & &value_mask))?;
        info!("found {} cold days", cold.height());
        Ok(cold)
    }

    fn truncated_dates(&self) -> Result<Series, CleanError> {
        let times = self.df.column("referenceTime")?.str()?;
        let epoch = NaiveDate::default();
        let days: Int32Chunked = times
            .into_iter()
            .map(|opt| {
                opt.and_then(parse_observation_date)
                    .map(|date| (date - epoch).num_days() as i32)
            })
            .collect();
        Ok(days
            .with_name("referenceTime".into())
            .into_date()
            .into_series())
    }

    fn split_element_ids(&self) -> Result<(Series, Series), CleanError> {
        let pattern = Regex::new(ELEMENT_ID_PATTERN)?;
        let ids = self.df.column("elementId")?.str()?;
        let mut statistics: Vec<Option<String>> = Vec::with_capacity(ids.len());
        let mut variables: Vec<Option<String>> = Vec::with_capacity(ids.len());
        for id in ids.into_iter() {
            match id.and_then(|s| pattern.captures(s)) {
                Some(caps) => {
                    statistics.push(Some(caps[1].to_string()));
                    variables.push(Some(caps[2].to_string()));
                }
                None => {
                    statistics.push(None);
                    variables.push(None);
                }
            }
        }
        Ok((
            Series::new("statistikk".into(), statistics),
            Series::new("variable".into(), variables),
        ))
    }

    fn mapped_cities(&self) -> Result<Series, CleanError> {
        let sources = self.df.column("sourceId")?.str()?;
        let cities: StringChunked = sources
            .into_iter()
            .map(|opt| opt.and_then(|code| self.registry.city_for_station(code)))
            .collect();
        Ok(cities.with_name("by".into()).into_series())
    }
}

fn category_label(code: f64) -> &'static str {
    if [0.0, 1.0, 2.0].contains(&code) {
        "Good"
    } else if [3.0, 4.0, 5.0].contains(&code) {
        "Medium"
    } else {
        "Poor"
    }
}

/// Parses a Frost reference time down to its calendar date.
///
/// Accepts RFC 3339 timestamps (the API format), bare datetimes, and plain
/// `YYYY-MM-DD` prefixes.
fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}
