use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("the codequality column has no non-missing values to derive a fill value from")]
    NoQualityData,

    #[error("invalid element id pattern")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
