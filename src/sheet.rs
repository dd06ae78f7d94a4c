//! Loading a spreadsheet into a header row and typed cells.
//!
//! Workbooks (`xlsx`, `xlsm`, `xls`, `xlsb`, `ods`) are opened with
//! `calamine`; anything else is treated as delimited text. Entirely blank
//! rows are dropped in both cases.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use calamine::{Data, DataType, Range, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{coerce::Cell, io_utils};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

#[derive(Debug, Clone)]
pub struct SheetOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub sheet_name: Option<String>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sheet_name: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();
        Self { headers, rows }
    }

    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

pub fn is_workbook(path: &Path) -> bool {
    io_utils::has_extension(path, WORKBOOK_EXTENSIONS)
}

pub fn read_sheet(path: &Path, options: &SheetOptions) -> Result<Sheet> {
    if is_workbook(path) {
        read_workbook(path, options.sheet_name.as_deref())
    } else {
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        read_delimited(path, delimiter, options.encoding)
    }
}

fn read_workbook(path: &Path, sheet_name: Option<&str>) -> Result<Sheet> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let range: Range<Data> = match sheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .with_context(|| format!("Reading sheet '{name}' from {path:?}"))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Workbook {path:?} has no worksheets"))?
            .with_context(|| format!("Reading first sheet from {path:?}"))?,
    };
    debug!(
        "Workbook {:?} range is {} row(s) by {} column(s)",
        path,
        range.height(),
        range.width()
    );

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|cell| workbook_cell(cell).as_text()).collect())
        .unwrap_or_default();
    let body = rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Ok(Sheet::new(headers, body))
}

fn workbook_cell(cell: &Data) -> Cell {
    if cell.is_empty() {
        return Cell::Empty;
    }
    if (cell.is_datetime() || cell.is_datetime_iso())
        && let Some(dt) = cell.as_datetime()
    {
        return Cell::DateTime(dt);
    }
    if let Some(i) = cell.get_int() {
        return Cell::Integer(i);
    }
    if let Some(f) = cell.get_float() {
        return Cell::Float(f);
    }
    if let Some(b) = cell.get_bool() {
        return Cell::Bool(b);
    }
    if let Some(s) = cell.get_string() {
        return Cell::from_text(s);
    }
    if matches!(cell, Data::Error(_)) {
        return Cell::Empty;
    }
    Cell::from_text(&cell.to_string())
}

fn read_delimited(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Sheet> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} in {path:?}", idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} in {path:?}", idx + 2))?;
        rows.push(decoded.iter().map(|v| Cell::from_text(v)).collect());
    }
    Ok(Sheet::new(headers, rows))
}

/// Display name for log lines; stdin shows as `<stdin>`.
pub fn source_name(path: &Path) -> PathBuf {
    if io_utils::is_dash(path) {
        PathBuf::from("<stdin>")
    } else {
        path.to_path_buf()
    }
}
