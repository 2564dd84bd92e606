//! Output formatting.

use colored::Colorize;
use otc_acc_env::GateOutcome;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub const MASK: &str = "********";

/// Print rows as a table, or as a JSON array.
pub fn print_rows<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table if rows.is_empty() => println!("{}", "No items found.".dimmed()),
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
        ),
    }
}

/// Gate outcome with colour for terminal output.
pub fn outcome_label(outcome: &GateOutcome) -> String {
    match outcome {
        GateOutcome::Proceed => "proceed".green().to_string(),
        GateOutcome::Skip(reason) => format!("{} ({reason})", "skip".yellow()),
        GateOutcome::Fail(reason) => format!("{} ({reason})", "fail".red().bold()),
    }
}

/// Gate outcome without colour, for JSON.
pub fn outcome_code(outcome: &GateOutcome) -> &'static str {
    match outcome {
        GateOutcome::Proceed => "proceed",
        GateOutcome::Skip(_) => "skip",
        GateOutcome::Fail(_) => "fail",
    }
}
