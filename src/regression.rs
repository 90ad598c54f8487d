//! Small linear-regression baselines over the cleaned observation table.
//!
//! The baseline predicts one weather variable from the month of the year:
//! [`month_features`] extracts the feature/target vectors for one city,
//! [`fit`] solves the ordinary-least-squares line in closed form, and
//! [`evaluate`] scores predictions with MSE and R².

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("column '{0}' is not present in the table")]
    MissingColumn(String),

    #[error("feature and target lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("at least two observations are needed to fit a line")]
    NotEnoughData,

    #[error("the feature has zero variance; a line cannot be fitted")]
    DegenerateFeature,

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// A fitted simple linear model `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Goodness-of-fit scores for a model over one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub mse: f64,
    pub r2: f64,
}

/// Extracts month-of-year features and observed values for one city and
/// weather variable.
///
/// Expects the cleaned layout with `referenceTime` as a date column (the
/// shape [`crate::WeatherCleaner::restructure`] produces). Rows with a
/// missing feature or value are dropped.
pub fn month_features(
    df: &DataFrame,
    city: &str,
    variable: &str,
) -> Result<(Vec<f64>, Vec<f64>), RegressionError> {
    for required in ["by", "variable", "referenceTime", "value"] {
        if df.column(required).is_err() {
            return Err(RegressionError::MissingColumn(required.to_string()));
        }
    }
    let selected = df
        .clone()
        .lazy()
        .filter(
            col("by")
                .eq(lit(city))
                .and(col("variable").eq(lit(variable))),
        )
        .select([
            col("referenceTime")
                .dt()
                .month()
                .cast(DataType::Float64)
                .alias("month"),
            col("value").cast(DataType::Float64),
        ])
        .drop_nulls(None)
        .collect()?;

    let months = selected.column("month")?.f64()?;
    let values = selected.column("value")?.f64()?;
    Ok((
        months.into_no_null_iter().collect(),
        values.into_no_null_iter().collect(),
    ))
}

/// Fits `y = intercept + slope * x` by ordinary least squares.
///
/// # Errors
///
/// Returns [`RegressionError::LengthMismatch`] for unequal vectors,
/// [`RegressionError::NotEnoughData`] for fewer than two points, and
/// [`RegressionError::DegenerateFeature`] when every `x` is identical.
pub fn fit(x: &[f64], y: &[f64]) -> Result<LinearModel, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(RegressionError::NotEnoughData);
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let sxx: f64 = x.iter().map(|v| (v - mean_x).powi(2)).sum();
    if sxx == 0.0 {
        return Err(RegressionError::DegenerateFeature);
    }
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xv, yv)| (xv - mean_x) * (yv - mean_y))
        .sum();
    let slope = sxy / sxx;
    Ok(LinearModel {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Scores `model` against observed data with mean squared error and R².
///
/// When the target has zero variance, R² is 1 for a perfect fit and 0
/// otherwise.
pub fn evaluate(
    model: &LinearModel,
    x: &[f64],
    y: &[f64],
) -> Result<Evaluation, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.is_empty() {
        return Err(RegressionError::NotEnoughData);
    }
    let n = x.len() as f64;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (xv, yv) in x.iter().zip(y) {
        ss_res += (yv - model.predict(*xv)).powi(2);
        ss_tot += (yv - mean_y).powi(2);
    }
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };
    Ok(Evaluation { mse: ss_res / n, r2 })
}
