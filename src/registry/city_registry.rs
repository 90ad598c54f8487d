//! Maps city names to Frost station codes, with inverse lookup.

use crate::registry::error::RegistryError;
use log::warn;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// A bidirectional mapping between city names and weather station codes.
///
/// The registry is loaded from a flat UTF-8 JSON object, e.g.
/// `{"Oslo": "SN18700", "Trondheim": "SN68230"}`. City names are unique by
/// construction (JSON object keys); station codes must be unique as well,
/// since the cleaner derives city names from station codes via
/// [`CityRegistry::city_for_station`].
#[derive(Debug, Clone, Default)]
pub struct CityRegistry {
    cities: HashMap<String, String>,
    stations: HashMap<String, String>,
}

impl CityRegistry {
    /// Builds a registry from a city-name → station-code mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateStationCode`] when two cities map
    /// to the same station code, which would make inverse lookup ambiguous.
    pub fn new(cities: HashMap<String, String>) -> Result<Self, RegistryError> {
        let mut stations = HashMap::with_capacity(cities.len());
        for (city, code) in &cities {
            if let Some(existing) = stations.insert(code.clone(), city.clone()) {
                return Err(RegistryError::DuplicateStationCode {
                    code: code.clone(),
                    first_city: existing,
                    second_city: city.clone(),
                });
            }
        }
        Ok(Self { cities, stations })
    }

    /// A registry with no known cities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a registry from a JSON file, failing on any problem.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when the file does not exist,
    /// [`RegistryError::Io`] for other read failures,
    /// [`RegistryError::Format`] when the content is not a JSON object of
    /// strings, and [`RegistryError::DuplicateStationCode`] when station
    /// codes collide.
    pub fn try_from_file(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                RegistryError::NotFound(path.to_path_buf())
            } else {
                RegistryError::Io(path.to_path_buf(), e)
            }
        })?;
        let cities: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| RegistryError::Format(path.to_path_buf(), e))?;
        Self::new(cities)
    }

    /// Loads a registry from a JSON file, degrading to an empty registry.
    ///
    /// Any failure is reported as a diagnostic and swallowed, so the caller
    /// can proceed with no known cities (every `sourceId` will then be
    /// unmapped during restructuring).
    pub fn from_file(path: &Path) -> Self {
        match Self::try_from_file(path) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("{e}; continuing with an empty city registry");
                Self::empty()
            }
        }
    }

    /// Looks up the station code registered for a city.
    pub fn station_for_city(&self, city: &str) -> Option<&str> {
        self.cities.get(city).map(String::as_str)
    }

    /// Inverse lookup: the city name registered for a station code.
    pub fn city_for_station(&self, code: &str) -> Option<&str> {
        self.stations.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn registry_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_mapping_and_inverse_lookup() {
        let file = registry_file(r#"{"Oslo": "SN18700", "Trondheim": "SN68230"}"#);
        let registry = CityRegistry::try_from_file(file.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.station_for_city("Oslo"), Some("SN18700"));
        assert_eq!(registry.city_for_station("SN68230"), Some("Trondheim"));
        assert_eq!(registry.city_for_station("SN00000"), None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        let err = CityRegistry::try_from_file(&path).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn malformed_json_is_format_error() {
        let file = registry_file("{not json");
        let err = CityRegistry::try_from_file(file.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Format(_, _)));
    }

    #[test]
    fn duplicate_station_codes_are_rejected() {
        let mut cities = HashMap::new();
        cities.insert("Oslo".to_string(), "SN18700".to_string());
        cities.insert("Oslo Blindern".to_string(), "SN18700".to_string());

        let err = CityRegistry::new(cities).unwrap_err();
        match err {
            RegistryError::DuplicateStationCode { code, .. } => assert_eq!(code, "SN18700"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lenient_load_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CityRegistry::from_file(&dir.path().join("nope.json")).is_empty());

        let file = registry_file("][");
        assert!(CityRegistry::from_file(file.path()).is_empty());
    }
}
