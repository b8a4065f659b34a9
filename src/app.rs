//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the decode-and-normalize pipeline
//! - prints reports
//! - writes optional exports
//! - launches the TUI

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, NormalizeArgs, TuiArgs};
use crate::domain::{DashboardConfig, Selection};
use crate::error::AppError;
use crate::io::decode::Upload;
use crate::normalize::filter_points;

pub mod pipeline;
pub mod session;

/// Entry point for the `rbench` binary.
pub fn run() -> Result<(), AppError> {
    // Logs go to stderr so they never interleave with report output; the TUI
    // surfaces failures through its status line instead.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // We want `rbench` and `rbench -f prices.xlsx` to behave like
    // `rbench tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Normalize(args) => handle_normalize(args),
    }
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let config = DashboardConfig {
        file: args.file,
        selection: Selection::new(&args.days, &args.acriss),
        apply_filter: true,
        export_json: None,
        export_csv: None,
    };
    crate::tui::run(config)
}

fn handle_normalize(args: NormalizeArgs) -> Result<(), AppError> {
    let apply_filter = !args.days.is_empty() || !args.acriss.is_empty();
    let config = DashboardConfig {
        file: Some(args.file.clone()),
        selection: Selection::new(&args.days, &args.acriss),
        apply_filter,
        export_json: args.export_json,
        export_csv: args.export_csv,
    };

    let upload = Upload::from_path(&args.file)?;
    let output = pipeline::run_upload(&upload).map_err(|e| {
        tracing::warn!(file = %args.file.display(), error = %e, "upload failed");
        AppError::from(e)
    })?;

    let points = if config.apply_filter {
        filter_points(&output.points, &config.selection)
    } else {
        output.points.clone()
    };

    println!("{}", crate::report::format_upload_summary(&output, &config));
    println!("{}", crate::report::format_points_table(&points));
    println!(
        "{}",
        crate::report::format_competitor_summary(&crate::report::summarize_competitors(&points))
    );

    // Optional exports. The JSON carries the full (unfiltered) table; the
    // CSV carries the points actually printed.
    if let Some(path) = &config.export_json {
        crate::io::export::write_table_json(path, &output.table)?;
    }
    if let Some(path) = &config.export_csv {
        crate::io::export::write_points_csv(path, &points)?;
    }

    Ok(())
}

/// Rewrite argv so `rbench` defaults to `rbench tui`.
///
/// Rules:
/// - `rbench`                      -> `rbench tui`
/// - `rbench -f prices.xlsx ...`   -> `rbench tui -f prices.xlsx ...`
/// - `rbench --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "normalize");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(argv(&["rbench"])), argv(&["rbench", "tui"]));
    }

    #[test]
    fn leading_flag_is_treated_as_tui_flags() {
        assert_eq!(
            rewrite_args(argv(&["rbench", "-f", "prices.xlsx"])),
            argv(&["rbench", "tui", "-f", "prices.xlsx"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(argv(&["rbench", "normalize", "-f", "x.csv"])),
            argv(&["rbench", "normalize", "-f", "x.csv"])
        );
        assert_eq!(rewrite_args(argv(&["rbench", "--help"])), argv(&["rbench", "--help"]));
    }
}
