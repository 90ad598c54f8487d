use crate::cleaner::CleanError;
use crate::registry::RegistryError;
use crate::regression::RegressionError;
use crate::stats::StatsError;
use thiserror::Error;

/// Crate-level error, wrapping the per-module errors so that callers
/// sequencing several pipeline steps can use a single error type.
#[derive(Debug, Error)]
pub enum VaerdataError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error(transparent)]
    Regression(#[from] RegressionError),
}
