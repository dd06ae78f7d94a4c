use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::{coerce, ledger::DEFAULT_DUE_THRESHOLD_KM};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize fleet maintenance spreadsheets into a clean ledger",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show how each spreadsheet column maps onto the canonical fields
    Headers(HeadersArgs),
    /// Normalize a spreadsheet into a chronologically ordered ledger
    Import(ImportArgs),
    /// Summarise a maintenance spreadsheet
    Stats(StatsArgs),
}

/// Options shared by every command that reads a spreadsheet.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Spreadsheet to read (.xlsx, .xls, .ods, .csv, .tsv; '-' for CSV on stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Worksheet name inside a workbook (defaults to the first sheet)
    #[arg(long = "sheet")]
    pub sheet: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct HeadersArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Keep records whose plate contains this text (case-insensitive)
    #[arg(long)]
    pub plate: Option<String>,
    /// Keep records from this region only
    #[arg(long)]
    pub region: Option<String>,
    /// Keep records performed by this technician only
    #[arg(long)]
    pub technician: Option<String>,
    /// Earliest service date (DD.MM.YYYY); undated records are dropped
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,
    /// Latest service date (DD.MM.YYYY); undated records are dropped
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output ledger (.csv or .xlsx); CSV on stdout if omitted
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Km gap to the next service at which a vehicle counts as due
    #[arg(long = "due-threshold", default_value_t = DEFAULT_DUE_THRESHOLD_KM)]
    pub due_threshold: u64,
    /// Keep the sheet's own serial numbers instead of renumbering
    #[arg(long = "keep-serial")]
    pub keep_serial: bool,
    /// Prefix CSV output with a UTF-8 byte order mark for Excel
    #[arg(long)]
    pub bom: bool,
    /// Render the ledger as a table on stdout instead of writing CSV
    #[arg(long = "table", conflicts_with = "output")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Km gap to the next service at which a vehicle counts as due
    #[arg(long = "due-threshold", default_value_t = DEFAULT_DUE_THRESHOLD_KM)]
    pub due_threshold: u64,
    /// Day the monthly and weekly counts are relative to (defaults to today)
    #[arg(long = "as-of", value_parser = parse_date_arg)]
    pub as_of: Option<NaiveDate>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

/// Accepts anything the date coercer reads, e.g. `07.10.2025` or `20251007`.
pub fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    coerce::coerce_date(&coerce::Cell::from_text(value)).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn delimiter_names_resolve() {
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("ş").is_err());
    }

    #[test]
    fn date_arguments_use_the_coercer() {
        assert_eq!(
            parse_date_arg("07.10.2025"),
            Ok(NaiveDate::from_ymd_opt(2025, 10, 7).unwrap())
        );
        assert!(parse_date_arg("someday").is_err());
    }
}
