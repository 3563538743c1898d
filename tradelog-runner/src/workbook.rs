//! The persistent journal workbook.
//!
//! A single JSON file holding named sheets in insertion order; each sheet is
//! a header row plus data rows of strings. Semantics match the journal's
//! contract: open or create, create a sheet with its header exactly once,
//! append below existing rows, never overwrite or dedupe. Files written by
//! a newer schema version are rejected on load rather than misread.
//!
//! Single-process use only — there is no locking, and concurrent writers
//! are last-save-wins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Workbook file schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to access workbook {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("workbook {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },

    #[error("workbook schema version {found} is newer than supported {max}")]
    UnsupportedVersion { found: u32, max: u32 },
}

/// One sheet: a fixed header and append-only rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn append_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// A multi-sheet journal workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub schema_version: u32,
    pub sheets: IndexMap<String, Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Workbook {
            schema_version: SCHEMA_VERSION,
            sheets: IndexMap::new(),
        }
    }

    /// Open an existing workbook file, or start a fresh one if the file does
    /// not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self, WorkbookError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path).map_err(|source| WorkbookError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let workbook: Workbook =
            serde_json::from_str(&content).map_err(|source| WorkbookError::Corrupt {
                path: path.display().to_string(),
                source,
            })?;
        if workbook.schema_version > SCHEMA_VERSION {
            return Err(WorkbookError::UnsupportedVersion {
                found: workbook.schema_version,
                max: SCHEMA_VERSION,
            });
        }
        Ok(workbook)
    }

    /// The named sheet, created with `header` if absent. An existing sheet's
    /// header is never rewritten, even when it disagrees with `header`.
    pub fn sheet_mut(&mut self, name: &str, header: &[&str]) -> &mut Sheet {
        if let Some(existing) = self.sheets.get(name) {
            if existing.columns.len() != header.len() {
                warn!(
                    "sheet {name:?} has {} columns but the writer expects {}; keeping the existing header",
                    existing.columns.len(),
                    header.len()
                );
            }
        }
        self.sheets.entry(name.to_string()).or_insert_with(|| Sheet {
            columns: header.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        })
    }

    /// Write the whole workbook to disk.
    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        let wrap_io = |source| WorkbookError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(wrap_io)?;
            }
        }
        let json = serde_json::to_string_pretty(self).expect("workbook serialization failed");
        std::fs::write(path, json).map_err(wrap_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 3] = ["A", "B", "C"];

    #[test]
    fn missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let workbook = Workbook::load_or_create(&dir.path().join("journal.json")).unwrap();
        assert!(workbook.sheets.is_empty());
        assert_eq!(workbook.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn sheet_created_with_header_once() {
        let mut workbook = Workbook::new();
        let sheet = workbook.sheet_mut("CurrentMonth", &HEADER);
        assert_eq!(sheet.columns, vec!["A", "B", "C"]);
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn append_goes_below_existing_rows() {
        let mut workbook = Workbook::new();
        let sheet = workbook.sheet_mut("CurrentMonth", &HEADER);
        sheet.append_row(vec!["1".into(), "2".into(), "3".into()]);
        sheet.append_row(vec!["4".into(), "5".into(), "6".into()]);

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1][0], "4");
    }

    #[test]
    fn save_load_round_trip_appends_below() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        let mut workbook = Workbook::new();
        workbook
            .sheet_mut("CurrentMonth", &HEADER)
            .append_row(vec!["1".into(), "2".into(), "3".into()]);
        workbook.save(&path).unwrap();

        // Second run: reopen, append, save.
        let mut reopened = Workbook::load_or_create(&path).unwrap();
        reopened
            .sheet_mut("CurrentMonth", &HEADER)
            .append_row(vec!["4".into(), "5".into(), "6".into()]);
        reopened.save(&path).unwrap();

        let final_book = Workbook::load_or_create(&path).unwrap();
        let sheet = &final_book.sheets["CurrentMonth"];
        assert_eq!(sheet.columns, vec!["A", "B", "C"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], "1");
        assert_eq!(sheet.rows[1][0], "4");
    }

    #[test]
    fn existing_header_is_never_rewritten() {
        let mut workbook = Workbook::new();
        workbook.sheet_mut("S", &HEADER);
        let sheet = workbook.sheet_mut("S", &["different", "header"]);
        assert_eq!(sheet.columns, vec!["A", "B", "C"]);
    }

    #[test]
    fn sheets_keep_insertion_order() {
        let mut workbook = Workbook::new();
        workbook.sheet_mut("March", &HEADER);
        workbook.sheet_mut("April", &HEADER);
        let names: Vec<_> = workbook.sheets.keys().cloned().collect();
        assert_eq!(names, vec!["March", "April"]);
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        std::fs::write(&path, r#"{"schema_version": 99, "sheets": {}}"#).unwrap();

        let err = Workbook::load_or_create(&path).unwrap_err();
        assert!(matches!(
            err,
            WorkbookError::UnsupportedVersion { found: 99, .. }
        ));
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        std::fs::write(&path, "{{{{").unwrap();
        assert!(matches!(
            Workbook::load_or_create(&path).unwrap_err(),
            WorkbookError::Corrupt { .. }
        ));
    }
}
