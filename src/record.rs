//! Maintenance records built from a normalized sheet.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    coerce::{self, Cell, UNPARSED_SORT_KEY},
    fields::{CanonicalField, HeaderMapping, normalize_headers},
    sheet::Sheet,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceRecord {
    /// 1-based data row in the source sheet (header excluded).
    pub row: usize,
    pub serial: Option<u64>,
    pub plate: String,
    pub door_number: Option<String>,
    pub region: Option<String>,
    pub date: Option<NaiveDate>,
    pub odometer_at_service: Option<u64>,
    pub odometer_next_service: Option<u64>,
    pub work_performed: Option<String>,
    pub other_notes: Option<String>,
    pub performed_by: Option<String>,
}

impl MaintenanceRecord {
    pub fn new(row: usize, plate: impl Into<String>) -> Self {
        Self {
            row,
            serial: None,
            plate: plate.into(),
            door_number: None,
            region: None,
            date: None,
            odometer_at_service: None,
            odometer_next_service: None,
            work_performed: None,
            other_notes: None,
            performed_by: None,
        }
    }

    pub fn date_sort_key(&self) -> u32 {
        self.date
            .map(coerce::date_sort_key)
            .unwrap_or(UNPARSED_SORT_KEY)
    }

    pub fn date_display(&self) -> String {
        self.date
            .map(coerce::format_date)
            .unwrap_or_else(|| "-".to_string())
    }

    /// Text of a free-form field, if the field is textual.
    pub fn text(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::PlateNumber => Some(self.plate.as_str()),
            CanonicalField::DoorNumber => self.door_number.as_deref(),
            CanonicalField::Region => self.region.as_deref(),
            CanonicalField::WorkPerformed => self.work_performed.as_deref(),
            CanonicalField::OtherNotes => self.other_notes.as_deref(),
            CanonicalField::PerformedBy => self.performed_by.as_deref(),
            CanonicalField::SerialNumber
            | CanonicalField::Date
            | CanonicalField::OdometerAtService
            | CanonicalField::OdometerNextService => None,
        }
    }
}

/// Counters gathered while turning sheet rows into records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub imported: usize,
    pub skipped_without_plate: usize,
    pub unparsed_dates: usize,
    pub unparsed_odometers: usize,
    pub unparsed_serials: usize,
}

#[derive(Debug)]
pub struct RecordBuilder<'a> {
    sheet: &'a Sheet,
    mapping: HeaderMapping,
}

impl<'a> RecordBuilder<'a> {
    /// Matches the sheet headers and checks that a plate column exists.
    pub fn from_sheet(sheet: &'a Sheet) -> Result<Self> {
        let mapping = normalize_headers(&sheet.headers);
        for binding in mapping.bindings() {
            debug!(
                "Column {} '{}' -> {}",
                binding.index + 1,
                binding.original,
                binding.field
            );
        }
        if !mapping.contains(CanonicalField::PlateNumber) {
            bail!(
                "Required column {} not found; headers were {:?}",
                CanonicalField::PlateNumber.label(),
                sheet.headers
            );
        }
        Ok(Self { sheet, mapping })
    }

    pub fn mapping(&self) -> &HeaderMapping {
        &self.mapping
    }

    pub fn build(&self) -> (Vec<MaintenanceRecord>, ImportReport) {
        let mut report = ImportReport::default();
        let mut records = Vec::with_capacity(self.sheet.rows.len());
        for row_idx in 0..self.sheet.rows.len() {
            report.rows_read += 1;
            match self.build_row(row_idx, &mut report) {
                Some(record) => {
                    report.imported += 1;
                    records.push(record);
                }
                None => report.skipped_without_plate += 1,
            }
        }
        (records, report)
    }

    fn cell(&self, row_idx: usize, field: CanonicalField) -> &Cell {
        match self.mapping.column_for(field) {
            Some(column) => self.sheet.cell(row_idx, column),
            None => &Cell::Empty,
        }
    }

    fn text(&self, row_idx: usize, field: CanonicalField) -> Option<String> {
        let cell = self.cell(row_idx, field);
        if cell.is_empty() {
            None
        } else {
            Some(cell.as_text())
        }
    }

    fn odometer(
        &self,
        row_idx: usize,
        field: CanonicalField,
        report: &mut ImportReport,
    ) -> Option<u64> {
        let cell = self.cell(row_idx, field);
        if cell.is_empty() {
            return None;
        }
        match coerce::coerce_integer(cell) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Row {}: {} {err}", row_idx + 1, field.label());
                report.unparsed_odometers += 1;
                None
            }
        }
    }

    fn build_row(&self, row_idx: usize, report: &mut ImportReport) -> Option<MaintenanceRecord> {
        let plate = self.text(row_idx, CanonicalField::PlateNumber)?;
        let mut record = MaintenanceRecord::new(row_idx + 1, plate);

        let serial_cell = self.cell(row_idx, CanonicalField::SerialNumber);
        if !serial_cell.is_empty() {
            match coerce::coerce_integer(serial_cell) {
                Ok(serial) => record.serial = Some(serial),
                Err(err) => {
                    warn!(
                        "Row {}: {} {err}",
                        row_idx + 1,
                        CanonicalField::SerialNumber.label()
                    );
                    report.unparsed_serials += 1;
                }
            }
        }

        let date_cell = self.cell(row_idx, CanonicalField::Date);
        if !date_cell.is_empty() {
            match coerce::coerce_date(date_cell) {
                Ok(date) => record.date = Some(date),
                Err(err) => {
                    warn!("Row {}: {} {err}", row_idx + 1, CanonicalField::Date.label());
                    report.unparsed_dates += 1;
                }
            }
        }

        record.odometer_at_service =
            self.odometer(row_idx, CanonicalField::OdometerAtService, report);
        record.odometer_next_service =
            self.odometer(row_idx, CanonicalField::OdometerNextService, report);
        record.door_number = self.text(row_idx, CanonicalField::DoorNumber);
        record.region = self.text(row_idx, CanonicalField::Region);
        record.work_performed = self.text(row_idx, CanonicalField::WorkPerformed);
        record.other_notes = self.text(row_idx, CanonicalField::OtherNotes);
        record.performed_by = self.text(row_idx, CanonicalField::PerformedBy);
        Some(record)
    }
}
