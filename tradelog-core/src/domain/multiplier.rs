//! Instrument multiplier table — converts price-points P&L into currency.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors loading the multiplier table from disk.
#[derive(Debug, Error)]
pub enum MultiplierError {
    #[error("failed to read multiplier file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("multiplier file {path} is not a valid JSON object: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
}

/// Immutable mapping from instrument symbol to contract multiplier.
///
/// Loaded once at startup and passed into the fill parser explicitly;
/// unknown symbols default to a multiplier of 1.
#[derive(Debug, Clone, Default)]
pub struct MultiplierTable {
    map: HashMap<String, f64>,
}

impl MultiplierTable {
    pub fn from_map(map: HashMap<String, f64>) -> Self {
        Self { map }
    }

    /// Load from a JSON object file, e.g. `{"MNQ JUN24": 2.0, "ES": 50.0}`.
    pub fn load(path: &Path) -> Result<Self, MultiplierError> {
        let content = std::fs::read_to_string(path).map_err(|source| MultiplierError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let map = serde_json::from_str(&content).map_err(|source| MultiplierError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { map })
    }

    /// Load from disk, falling back to an empty table (every instrument
    /// multiplied by 1) when the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(err) => {
                warn!("using default multipliers: {err}");
                Self::default()
            }
        }
    }

    /// Multiplier for an instrument; 1 when the symbol is unknown.
    pub fn get(&self, instrument: &str) -> f64 {
        self.map.get(instrument).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_instrument_multiplier() {
        let table = MultiplierTable::from_map([("MNQ".to_string(), 2.0)].into_iter().collect());
        assert_eq!(table.get("MNQ"), 2.0);
    }

    #[test]
    fn unknown_instrument_defaults_to_one() {
        let table = MultiplierTable::default();
        assert_eq!(table.get("ES"), 1.0);
    }

    #[test]
    fn load_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multipliers.json");
        std::fs::write(&path, r#"{"MNQ JUN24": 2.0, "ES": 50.0}"#).unwrap();

        let table = MultiplierTable::load(&path).unwrap();
        assert_eq!(table.get("MNQ JUN24"), 2.0);
        assert_eq!(table.get("ES"), 50.0);
        assert_eq!(table.get("CL"), 1.0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = MultiplierTable::load_or_default(&dir.path().join("nope.json"));
        assert!(table.is_empty());
        assert_eq!(table.get("MNQ"), 1.0);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multipliers.json");
        std::fs::write(&path, "not json").unwrap();

        let err = MultiplierTable::load(&path).unwrap_err();
        assert!(matches!(err, MultiplierError::Corrupt { .. }));
    }
}
