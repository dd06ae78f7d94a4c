pub mod cli;
pub mod coerce;
pub mod export;
pub mod fields;
pub mod headers;
pub mod import;
pub mod io_utils;
pub mod ledger;
pub mod record;
pub mod sheet;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, InputArgs},
    sheet::{Sheet, SheetOptions},
};

pub use coerce::{
    Cell, DateDisplay, Unparseable, coerce_date, coerce_integer, display_date, format_grouped,
};
pub use fields::{CanonicalField, HeaderMapping, normalize_headers};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("fleet_intake", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Headers(args) => headers::execute(&args),
        Commands::Import(args) => import::execute(&args),
        Commands::Stats(args) => stats::execute(&args),
    }
}

pub(crate) fn load_sheet(args: &InputArgs) -> Result<Sheet> {
    let options = SheetOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        sheet_name: args.sheet.clone(),
    };
    let sheet = sheet::read_sheet(&args.input, &options)
        .with_context(|| format!("Reading spreadsheet {:?}", args.input))?;
    info!(
        "Read {} column(s) and {} row(s) from {:?}",
        sheet.headers.len(),
        sheet.rows.len(),
        sheet::source_name(&args.input)
    );
    Ok(sheet)
}
