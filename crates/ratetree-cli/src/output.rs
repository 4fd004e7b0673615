//! Output formatting utilities.
//!
//! Reports go to stdout in the selected format; status lines go to stderr
//! so JSON and CSV output stay machine readable.

use std::io::Write;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Prints rows in `format`.
pub fn print_output<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", render_table(rows));
            Ok(())
        }
        OutputFormat::Json => print_json_value(&rows),
        OutputFormat::Csv => {
            serialize_csv(csv::Writer::from_writer(std::io::stdout()), rows)?;
            Ok(())
        }
    }
}

/// Prints any serializable value as pretty JSON.
pub fn print_json_value<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes rows to a CSV file at `path`.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> CliResult<()> {
    serialize_csv(csv::Writer::from_path(path)?, rows)
}

fn serialize_csv<W: Write, T: Serialize>(mut writer: csv::Writer<W>, rows: &[T]) -> CliResult<()> {
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn render_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "No results.".to_string();
    }
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string()
}

/// Formats a rate as a percentage string.
pub fn format_percent(value: f64) -> String {
    format!("{:.4}%", value * 100.0)
}

/// Table cell with six decimals.
pub fn format_f64(value: &f64) -> String {
    format!("{value:.6}")
}

/// Table cell holding a rate, shown as a percentage.
pub fn format_percent_cell(value: &f64) -> String {
    format_percent(*value)
}

/// Status line on stderr.
pub fn print_success(message: &str) {
    eprintln!("{} {message}", "✓".green());
}

/// Warning line on stderr.
pub fn print_warning(message: &str) {
    eprintln!("{} {message}", "⚠".yellow());
}

/// Prints a section title, in table mode only.
pub fn print_header(title: &str, format: OutputFormat) {
    if format == OutputFormat::Table {
        println!("\n{}", title.bold().underline());
    }
}

/// One labelled figure of a summary table.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KeyValue {
    #[tabled(rename = "Metric")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl KeyValue {
    /// Label and preformatted value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Label and a number with `precision` decimals.
    pub fn from_f64(key: impl Into<String>, value: f64, precision: usize) -> Self {
        Self::new(key, format!("{value:.precision$}"))
    }

    /// Label and a rate shown as a percentage.
    pub fn from_percent(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, format_percent(value))
    }
}
