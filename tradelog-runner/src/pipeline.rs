//! The two pipeline stages.
//!
//! Stage 1 (`run_generate`) drains the watch directory: each raw execution
//! export is parsed into fills, aggregated into trades, written as a staged
//! trades CSV, and archived. Stage 2 (`run_import`) drains the staging
//! directory: each staged file's rows are flattened into journal rows,
//! appended to the workbook sheet, and archived.
//!
//! Isolation is per-row and per-file: a malformed row is logged and skipped,
//! a failing file is logged and left in place, and neither ever aborts
//! sibling work. Only setup failures (no input files, a workbook that cannot
//! be read or saved) propagate to the caller.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use tradelog_core::aggregate::aggregate;
use tradelog_core::domain::MultiplierTable;
use tradelog_core::flatten::{flatten_row, TradeRow, JOURNAL_COLUMNS};
use tradelog_core::ingest::{FillParser, RawFillRow};

use crate::config::RunnerConfig;
use crate::intake::{self, IntakeError};
use crate::workbook::Workbook;

/// Outcome of the generation stage.
#[derive(Debug, Default)]
pub struct GenerateSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub rows_skipped: usize,
    pub trades_staged: usize,
    pub realized_points: f64,
    pub realized_dollars: f64,
    pub staged_files: Vec<PathBuf>,
}

/// Outcome of the import stage.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub files_processed: usize,
    pub files_failed: usize,
    pub rows_appended: usize,
    pub rows_skipped: usize,
    pub tp_legs_dropped: usize,
}

struct StagedFile {
    path: PathBuf,
    trades: usize,
    rows_skipped: usize,
    realized_points: f64,
    realized_dollars: f64,
}

struct ImportedFile {
    rows_appended: usize,
    rows_skipped: usize,
    tp_legs_dropped: usize,
}

/// Stage 1: parse and aggregate every pending raw export, staging one trades
/// CSV per input file. No pending files is a setup failure.
pub fn run_generate(config: &RunnerConfig) -> Result<GenerateSummary> {
    let multipliers = MultiplierTable::load_or_default(&config.multipliers_path);
    let parser = FillParser::new(multipliers);

    let files = intake::pending_files(&config.input_dir, "csv")?;
    std::fs::create_dir_all(&config.staging_dir).with_context(|| {
        format!(
            "failed to create staging dir {}",
            config.staging_dir.display()
        )
    })?;
    let archive_dir = config.input_archive_dir();

    let mut summary = GenerateSummary::default();
    for file in files {
        match generate_one(&parser, &file, &config.staging_dir) {
            Ok(staged) => {
                info!(
                    "staged {} trade(s) from {} into {}",
                    staged.trades,
                    file.display(),
                    staged.path.display()
                );
                summary.files_processed += 1;
                summary.rows_skipped += staged.rows_skipped;
                summary.trades_staged += staged.trades;
                summary.realized_points += staged.realized_points;
                summary.realized_dollars += staged.realized_dollars;
                summary.staged_files.push(staged.path);
                // Trades are already staged; an archive failure leaves the
                // raw file behind, and a re-run will re-stage duplicates.
                if let Err(err) = intake::archive_file(&file, &archive_dir) {
                    error!("{err}");
                }
            }
            Err(err) => {
                error!("skipping {}: {err:#}", file.display());
                summary.files_failed += 1;
            }
        }
    }
    Ok(summary)
}

fn generate_one(parser: &FillParser, file: &Path, staging_dir: &Path) -> Result<StagedFile> {
    let mut reader = csv::Reader::from_path(file)
        .with_context(|| format!("failed to open {}", file.display()))?;

    let mut fills = Vec::new();
    let mut rows_skipped = 0usize;
    for row in reader.deserialize::<RawFillRow>() {
        match row {
            Ok(raw) => fills.push(parser.parse_row(&raw)),
            Err(err) => {
                error!("skipping malformed row in {}: {err}", file.display());
                rows_skipped += 1;
            }
        }
    }

    let trades = aggregate(fills);
    let realized_points = trades.iter().map(|t| t.realized_points()).sum();
    let realized_dollars = trades.iter().map(|t| t.realized_dollars()).sum();

    let path = staged_path(staging_dir);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for trade in &trades {
        writer.serialize(TradeRow::from_trade(trade))?;
    }
    writer.flush()?;

    Ok(StagedFile {
        path,
        trades: trades.len(),
        rows_skipped,
        realized_points,
        realized_dollars,
    })
}

/// Staged file name: `<MMDDYYYY>trades.csv`, with a numeric suffix when that
/// name is already taken (several exports processed the same day).
fn staged_path(staging_dir: &Path) -> PathBuf {
    let base = format!("{}trades", chrono::Local::now().format("%m%d%Y"));
    let mut candidate = staging_dir.join(format!("{base}.csv"));
    let mut n = 2;
    while candidate.exists() {
        candidate = staging_dir.join(format!("{base}_{n}.csv"));
        n += 1;
    }
    candidate
}

/// Stage 2: flatten every staged trades CSV into the journal workbook.
/// An empty staging directory is a quiet no-op, not a failure; a workbook
/// that cannot be read or saved is a setup failure.
pub fn run_import(config: &RunnerConfig) -> Result<ImportSummary> {
    let files = match intake::pending_files(&config.staging_dir, "csv") {
        Ok(files) => files,
        Err(IntakeError::NoInputFiles { .. }) => {
            info!("no staged files to import");
            return Ok(ImportSummary::default());
        }
        Err(err) => return Err(err.into()),
    };

    let mut workbook = Workbook::load_or_create(&config.journal_path)?;
    let archive_dir = config.staging_archive_dir();

    let mut summary = ImportSummary::default();
    for file in files {
        match import_one(&mut workbook, &file, &config.sheet_name) {
            Ok(imported) => {
                // An unsavable journal aborts the stage: carrying this
                // file's rows in memory past a failed save would let a
                // later successful save persist them while the file itself
                // stays pending, duplicating on retry.
                workbook
                    .save(&config.journal_path)
                    .with_context(|| format!("aborting import at {}", file.display()))?;
                info!(
                    "appended {} row(s) from {} to sheet {:?}",
                    imported.rows_appended,
                    file.display(),
                    config.sheet_name
                );
                summary.files_processed += 1;
                summary.rows_appended += imported.rows_appended;
                summary.rows_skipped += imported.rows_skipped;
                summary.tp_legs_dropped += imported.tp_legs_dropped;
                // The journal already holds this file's rows; an archive
                // failure means a re-run will append duplicates.
                if let Err(err) = intake::archive_file(&file, &archive_dir) {
                    error!("{err}");
                }
            }
            Err(err) => {
                error!("skipping {}: {err:#}", file.display());
                summary.files_failed += 1;
            }
        }
    }
    Ok(summary)
}

fn import_one(workbook: &mut Workbook, file: &Path, sheet_name: &str) -> Result<ImportedFile> {
    let mut reader = csv::Reader::from_path(file)
        .with_context(|| format!("failed to open {}", file.display()))?;

    let mut imported = ImportedFile {
        rows_appended: 0,
        rows_skipped: 0,
        tp_legs_dropped: 0,
    };
    let sheet = workbook.sheet_mut(sheet_name, &JOURNAL_COLUMNS);
    for row in reader.deserialize::<TradeRow>() {
        let raw = match row {
            Ok(raw) => raw,
            Err(err) => {
                error!("skipping malformed row in {}: {err}", file.display());
                imported.rows_skipped += 1;
                continue;
            }
        };
        match flatten_row(&raw) {
            Ok(flat) => {
                sheet.append_row(flat.row.to_record());
                imported.rows_appended += 1;
                imported.tp_legs_dropped += flat.tp_overflow;
            }
            Err(err) => {
                error!("skipping row in {}: {err}", file.display());
                imported.rows_skipped += 1;
            }
        }
    }
    Ok(imported)
}
