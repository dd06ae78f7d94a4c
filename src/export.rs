//! Writing the normalized ledger as CSV or XLSX.
//!
//! Both formats share the canonical column labels and the same cell text:
//! `S.NO` renumbered from 1, dates as `DD.MM.YYYY`, odometers as plain
//! integers and missing values as empty cells.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Format, Workbook};

use crate::{
    coerce,
    fields::CanonicalField,
    io_utils,
    record::MaintenanceRecord,
};

pub const SHEET_NAME: &str = "Bakım Kayıtları";
const MAX_COLUMN_WIDTH: usize = 50;
/// Largest integer an XLSX number cell (an `f64`) holds exactly.
const MAX_EXACT_NUMBER: u64 = 1 << 53;

pub fn export_headers() -> Vec<String> {
    CanonicalField::EXPORT_ORDER
        .iter()
        .map(|field| field.label().to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Prefix CSV output with a UTF-8 byte order mark.
    pub bom: bool,
    /// Keep the sheet's own `S.NO` where it has one instead of renumbering.
    pub keep_serial: bool,
}

/// Cell text for one exported record, in [`CanonicalField::EXPORT_ORDER`].
pub fn export_row(
    position: usize,
    record: &MaintenanceRecord,
    options: &ExportOptions,
) -> Vec<String> {
    CanonicalField::EXPORT_ORDER
        .iter()
        .map(|field| match field {
            CanonicalField::SerialNumber => match record.serial {
                Some(serial) if options.keep_serial => serial.to_string(),
                _ => position.to_string(),
            },
            CanonicalField::Date => record.date.map(coerce::format_date).unwrap_or_default(),
            CanonicalField::OdometerAtService => optional_number(record.odometer_at_service),
            CanonicalField::OdometerNextService => optional_number(record.odometer_next_service),
            other => record.text(*other).unwrap_or_default().to_string(),
        })
        .collect()
}

fn optional_number(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes to `path` (XLSX when the extension says so) or CSV on stdout.
pub fn write_ledger(
    path: Option<&Path>,
    records: &[MaintenanceRecord],
    options: &ExportOptions,
) -> Result<()> {
    match path {
        Some(p) if io_utils::has_extension(p, &["xlsx"]) => write_xlsx(p, records, options),
        _ => write_csv(path, records, options),
    }
}

pub fn write_csv(
    path: Option<&Path>,
    records: &[MaintenanceRecord],
    options: &ExportOptions,
) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(path, options.bom)?;
    writer
        .write_record(export_headers())
        .context("Writing output headers")?;
    for (idx, record) in records.iter().enumerate() {
        writer
            .write_record(export_row(idx + 1, record, options))
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output")?;
    if let Some(p) = path.filter(|p| !io_utils::is_dash(p)) {
        info!("Wrote {} record(s) to {:?}", records.len(), p);
    }
    Ok(())
}

pub fn write_xlsx(
    path: &Path,
    records: &[MaintenanceRecord],
    options: &ExportOptions,
) -> Result<()> {
    let headers = export_headers();
    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| export_row(idx + 1, record, options))
        .collect();

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .context("Naming output worksheet")?;

    for (col, header) in headers.iter().enumerate() {
        let col = u16::try_from(col).context("Too many output columns")?;
        worksheet
            .write_string_with_format(0, col, header, &bold)
            .context("Writing output headers")?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let xl_row = u32::try_from(row_idx + 1).context("Too many output rows")?;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = u16::try_from(col).context("Too many output columns")?;
            let numeric = matches!(
                CanonicalField::EXPORT_ORDER[usize::from(col)],
                CanonicalField::SerialNumber
                    | CanonicalField::OdometerAtService
                    | CanonicalField::OdometerNextService
            );
            let written = match value.parse::<u64>() {
                Ok(number) if numeric && number <= MAX_EXACT_NUMBER => {
                    worksheet.write_number(xl_row, col, number as f64)
                }
                _ => worksheet.write_string(xl_row, col, value),
            };
            written.with_context(|| format!("Writing output row {}", row_idx + 2))?;
        }
    }

    for (col, width) in column_widths(&headers, &rows).into_iter().enumerate() {
        let col = u16::try_from(col).context("Too many output columns")?;
        worksheet
            .set_column_width(col, width as f64)
            .context("Sizing output columns")?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Saving workbook {path:?}"))?;
    info!("Wrote {} record(s) to {:?}", records.len(), path);
    Ok(())
}

/// Longest cell per column plus padding, capped at 50 characters.
fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .chain(std::iter::once(header))
                .map(|value| value.chars().count())
                .max()
                .unwrap_or(0);
            (longest + 2).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}
