//! Fetch, clean, and analyse Norwegian weather observations.
//!
//! The crate wraps a small data-analysis pipeline around the MET Norway
//! Frost API: a retrying HTTP client ([`FrostClient`]) fetches raw
//! observation documents, [`WeatherCleaner`] restructures them into a tidy
//! eight-column polars `DataFrame`, and the [`stats`] and [`regression`]
//! modules compute per-city summaries and linear baselines on the result.

mod cleaner;
mod error;
mod fetch;
mod registry;
pub mod regression;
pub mod stats;

pub use cleaner::{CleanError, WeatherCleaner};
pub use error::VaerdataError;
pub use fetch::FrostClient;
pub use registry::{CityRegistry, RegistryError};
