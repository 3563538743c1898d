//! Tradelog Runner — pipeline orchestration around `tradelog-core`.
//!
//! Owns everything that touches the filesystem:
//! - TOML run configuration
//! - Directory intake and archiving of processed files
//! - The two pipeline stages (generate staged trades, import into the journal)
//! - The persistent multi-sheet journal workbook
//! - Logging initialization

pub mod config;
pub mod intake;
pub mod logging;
pub mod pipeline;
pub mod workbook;

pub use config::RunnerConfig;
pub use pipeline::{run_generate, run_import, GenerateSummary, ImportSummary};
pub use workbook::{Sheet, Workbook, SCHEMA_VERSION};
