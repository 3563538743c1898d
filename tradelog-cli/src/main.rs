//! Tradelog CLI — trade journal generation commands.
//!
//! Commands:
//! - `run` — both pipeline stages: stage raw exports, then import into the journal
//! - `generate` — stage 1 only: raw exports → staged trades CSVs
//! - `import` — stage 2 only: staged trades CSVs → journal workbook
//! - `journal status` — report the workbook's sheets and row counts

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tradelog_runner::pipeline::{run_generate, run_import, GenerateSummary, ImportSummary};
use tradelog_runner::{logging, RunnerConfig, Workbook};

#[derive(Parser)]
#[command(name = "tradelog", about = "Tradelog CLI — trade journal generation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Configuration source and per-field overrides, shared by all commands.
#[derive(Args)]
struct ConfigArgs {
    /// Path to a TOML config file. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory watched for raw execution exports.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory for staged trades CSVs between the two stages.
    #[arg(long)]
    staging_dir: Option<PathBuf>,

    /// Path of the journal workbook.
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Sheet the import stage appends to.
    #[arg(long)]
    sheet: Option<String>,

    /// JSON file mapping instrument symbol to contract multiplier.
    #[arg(long)]
    multipliers: Option<PathBuf>,

    /// Also write daily-rotated log files to this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both stages: stage raw exports, then import into the journal.
    Run {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Stage 1 only: parse raw exports and stage trades CSVs.
    Generate {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Stage 2 only: import staged trades CSVs into the journal.
    Import {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Journal inspection commands.
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
}

#[derive(Subcommand)]
enum JournalAction {
    /// Report the workbook's sheets, row counts, and column counts.
    Status {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

impl ConfigArgs {
    fn resolve(&self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_file(path)?,
            None => RunnerConfig::default(),
        };
        if let Some(input_dir) = &self.input_dir {
            config.input_dir = input_dir.clone();
        }
        if let Some(staging_dir) = &self.staging_dir {
            config.staging_dir = staging_dir.clone();
        }
        if let Some(journal) = &self.journal {
            config.journal_path = journal.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet_name = sheet.clone();
        }
        if let Some(multipliers) = &self.multipliers {
            config.multipliers_path = multipliers.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Run { config }
        | Commands::Generate { config }
        | Commands::Import { config }
        | Commands::Journal {
            action: JournalAction::Status { config },
        } => config.resolve()?,
    };

    let _guard = logging::init(config.log_dir.as_deref());

    match cli.command {
        Commands::Run { .. } => {
            let generated = run_generate(&config)?;
            print_generate_summary(&generated);
            let imported = run_import(&config)?;
            print_import_summary(&imported, &config);
        }
        Commands::Generate { .. } => {
            let generated = run_generate(&config)?;
            print_generate_summary(&generated);
        }
        Commands::Import { .. } => {
            let imported = run_import(&config)?;
            print_import_summary(&imported, &config);
        }
        Commands::Journal { .. } => journal_status(&config)?,
    }

    Ok(())
}

fn print_generate_summary(summary: &GenerateSummary) {
    println!();
    println!("=== Generate ===");
    println!("Files processed: {}", summary.files_processed);
    println!("Files failed:    {}", summary.files_failed);
    println!("Rows skipped:    {}", summary.rows_skipped);
    println!("Trades staged:   {}", summary.trades_staged);
    println!("Realized:        {:.2} pts / ${:.2}", summary.realized_points, summary.realized_dollars);
    for path in &summary.staged_files {
        println!("Staged:          {}", path.display());
    }
}

fn print_import_summary(summary: &ImportSummary, config: &RunnerConfig) {
    println!();
    println!("=== Import ===");
    println!("Files processed: {}", summary.files_processed);
    println!("Files failed:    {}", summary.files_failed);
    println!("Rows appended:   {}", summary.rows_appended);
    println!("Rows skipped:    {}", summary.rows_skipped);
    if summary.tp_legs_dropped > 0 {
        println!(
            "WARNING: {} take-profit leg(s) beyond the 3-slot cap were dropped",
            summary.tp_legs_dropped
        );
    }
    println!(
        "Journal:         {} (sheet {:?})",
        config.journal_path.display(),
        config.sheet_name
    );
}

fn journal_status(config: &RunnerConfig) -> Result<()> {
    if !config.journal_path.exists() {
        println!("Journal does not exist yet: {}", config.journal_path.display());
        return Ok(());
    }

    let workbook = Workbook::load_or_create(&config.journal_path)?;
    println!("Journal: {}", config.journal_path.display());
    println!("Sheets:  {}", workbook.sheets.len());
    println!();
    println!("{:<20} {:>8} {:>8}", "Sheet", "Rows", "Columns");
    println!("{}", "-".repeat(38));
    for (name, sheet) in &workbook.sheets {
        println!("{:<20} {:>8} {:>8}", name, sheet.rows.len(), sheet.columns.len());
    }
    Ok(())
}
