//! Tradelog Core — fill parsing, trade reconstruction, and exit encoding.
//!
//! This crate contains the heart of the journal pipeline:
//! - Domain types (fills, trades, exit legs, the instrument multiplier table)
//! - Lenient parsing of raw execution rows exported from the trading platform
//! - Aggregation of fills into logical trades by entry key
//! - Exit classification (take-profit vs stop-loss) and the versioned
//!   exit-leg wire encoding used between the two pipeline stages
//! - Flattening of staged trade rows into journal rows
//!
//! No file-system orchestration lives here; directory intake, staging, and
//! the persistent workbook are in `tradelog-runner`.

pub mod aggregate;
pub mod domain;
pub mod exits;
pub mod flatten;
pub mod ingest;
