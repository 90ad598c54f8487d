use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("City registry file '{0}' was not found")]
    NotFound(PathBuf),

    #[error("Failed to read city registry file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("City registry file '{0}' is not a valid JSON object of city names to station codes")]
    Format(PathBuf, #[source] serde_json::Error),

    #[error("Station code '{code}' is mapped by both '{first_city}' and '{second_city}'; inverse lookup would be ambiguous")]
    DuplicateStationCode {
        code: String,
        first_city: String,
        second_city: String,
    },
}
