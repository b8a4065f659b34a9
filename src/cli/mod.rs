//! Command-line parsing for the pricing benchmark dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the pipeline code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "rbench",
    version,
    about = "Competitor car-rental pricing benchmark"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    ///
    /// Loads pricing files into the session, filters by duration/ACRISS
    /// selections, and renders the price chart plus summary tables.
    Tui(TuiArgs),
    /// Decode and normalize one pricing file, print the result, and
    /// optionally export it (useful for scripting).
    Normalize(NormalizeArgs),
}

/// Options for the interactive dashboard.
#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    /// Pricing file to preload (.csv or .xlsx).
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Rental durations (days) selected at start. Repeatable.
    #[arg(short = 'd', long = "days", value_name = "N")]
    pub days: Vec<u32>,

    /// ACRISS codes selected at start. Repeatable.
    #[arg(short = 'a', long = "acriss", value_name = "CODE")]
    pub acriss: Vec<String>,
}

/// Options for the one-shot pipeline run.
#[derive(Debug, Parser, Clone)]
pub struct NormalizeArgs {
    /// Pricing file to decode (.csv or .xlsx).
    #[arg(short = 'f', long)]
    pub file: PathBuf,

    /// Restrict printed/exported points to these durations. Repeatable.
    #[arg(short = 'd', long = "days", value_name = "N")]
    pub days: Vec<u32>,

    /// Restrict printed/exported points to these ACRISS codes. Repeatable.
    #[arg(short = 'a', long = "acriss", value_name = "CODE")]
    pub acriss: Vec<String>,

    /// Write the interchange JSON (columns + rows, ISO-8601 dates).
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Write the normalized points as CSV.
    #[arg(long = "export-csv", value_name = "PATH")]
    pub export_csv: Option<PathBuf>,
}
