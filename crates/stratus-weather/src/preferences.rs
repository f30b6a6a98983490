//! Saved-location preference.
//!
//! A flat JSON object of scalar values in the config directory. Reads and
//! writes are synchronous; every write rewrites the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::{Coordinate, WeatherError};

pub const PREFERENCES_FILE: &str = "preferences.json";
pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";

#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, f64>,
}

impl PreferenceStore {
    /// Open the store in `config_dir`.
    ///
    /// A missing or unparseable file is an empty store; the next write
    /// replaces it. Only I/O failures other than "not found" are errors.
    pub fn open(config_dir: &Path) -> Result<Self, WeatherError> {
        let path = config_dir.join(PREFERENCES_FILE);

        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(WeatherError::Preferences(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self { path, values })
    }

    /// Stored value, or 0.0 when the key was never written
    pub fn double(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set_double(&mut self, key: &str, value: f64) -> Result<(), WeatherError> {
        self.values.insert(key.to_string(), value);
        self.save()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), WeatherError> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    pub fn saved_coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.double(LATITUDE_KEY), self.double(LONGITUDE_KEY));
        coordinate.is_present().then_some(coordinate)
    }

    pub fn save_coordinate(&mut self, coordinate: Coordinate) -> Result<(), WeatherError> {
        self.values
            .insert(LATITUDE_KEY.to_string(), coordinate.latitude);
        self.values
            .insert(LONGITUDE_KEY.to_string(), coordinate.longitude);
        self.save()?;
        tracing::debug!("Saved coordinate {}", coordinate);
        Ok(())
    }

    pub fn clear_coordinate(&mut self) -> Result<(), WeatherError> {
        self.remove(LATITUDE_KEY)?;
        self.remove(LONGITUDE_KEY)
    }

    fn save(&self) -> Result<(), WeatherError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WeatherError::Preferences(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(&self.values)
            .map_err(|e| WeatherError::Preferences(e.to_string()))?;

        std::fs::write(&self.path, contents)
            .map_err(|e| WeatherError::Preferences(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_empty_store_has_no_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(dir.path()).unwrap();
        assert_eq!(store.double(LATITUDE_KEY), 0.0);
        assert!(store.saved_coordinate().is_none());
    }

    #[test]
    fn test_coordinate_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let mut store = PreferenceStore::open(dir.path()).unwrap();
        store
            .save_coordinate(Coordinate::new(48.8534, 2.3488))
            .unwrap();

        let reopened = PreferenceStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.saved_coordinate(),
            Some(Coordinate::new(48.8534, 2.3488))
        );
    }

    #[test]
    fn test_zero_pair_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path()).unwrap();
        store.save_coordinate(Coordinate::new(0.0, 0.0)).unwrap();
        assert!(store.saved_coordinate().is_none());
    }

    #[test]
    fn test_values_stored_under_fixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path()).unwrap();
        store.save_coordinate(Coordinate::new(1.5, -2.5)).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(PREFERENCES_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["latitude"], 1.5);
        assert_eq!(json["longitude"], -2.5);
    }

    #[test]
    fn test_clear_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PreferenceStore::open(dir.path()).unwrap();
        store.set_double(LATITUDE_KEY, 10.0).unwrap();
        store.set_double(LONGITUDE_KEY, 20.0).unwrap();
        assert!(store.saved_coordinate().is_some());

        store.clear_coordinate().unwrap();
        assert!(PreferenceStore::open(dir.path())
            .unwrap()
            .saved_coordinate()
            .is_none());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(PREFERENCES_FILE);
        std::fs::write(&file, "{ \"latitude\": 1.0,").unwrap();

        let mut store = PreferenceStore::open(dir.path()).unwrap();
        assert!(store.saved_coordinate().is_none());
        assert_eq!(store.double(LATITUDE_KEY), 0.0);

        store.save_coordinate(Coordinate::new(52.52, 13.41)).unwrap();
        let reopened = PreferenceStore::open(dir.path()).unwrap();
        assert_eq!(reopened.saved_coordinate(), Some(Coordinate::new(52.52, 13.41)));
    }

    #[test]
    fn test_wrong_value_types_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PREFERENCES_FILE),
            r#"{"latitude": "north", "longitude": 3.0}"#,
        )
        .unwrap();

        let store = PreferenceStore::open(dir.path()).unwrap();
        assert!(store.saved_coordinate().is_none());
    }

    #[test]
    fn test_clear_recovers_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PREFERENCES_FILE), "{ nope").unwrap();

        let mut store = PreferenceStore::open(dir.path()).unwrap();
        store.set_double(LATITUDE_KEY, 4.0).unwrap();
        store.clear_coordinate().unwrap();

        let raw = std::fs::read_to_string(dir.path().join(PREFERENCES_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
