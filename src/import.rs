//! The `import` command: read, normalize, order, filter and write a ledger.

use anyhow::Result;
use log::{info, warn};

use crate::{
    cli::{FilterArgs, ImportArgs},
    export::{self, ExportOptions},
    ledger::{self, RecordFilter},
    load_sheet,
    record::{ImportReport, MaintenanceRecord, RecordBuilder},
    sheet::Sheet,
    table,
};

pub fn execute(args: &ImportArgs) -> Result<()> {
    let sheet = load_sheet(&args.input)?;
    let filter = record_filter(&args.filter);
    let (records, report) = ledger_from_sheet(&sheet, &filter)?;
    log_report(&report, records.len());

    if args.table {
        print!("{}", table::render_ledger(&records, args.due_threshold));
    } else {
        let options = ExportOptions {
            bom: args.bom,
            keep_serial: args.keep_serial,
        };
        export::write_ledger(args.output.as_deref(), &records, &options)?;
    }

    let due = records
        .iter()
        .filter(|r| ledger::service_due(r, args.due_threshold))
        .count();
    if due > 0 {
        info!(
            "{} vehicle record(s) within {} km of their next service",
            due, args.due_threshold
        );
    }
    Ok(())
}

pub fn record_filter(args: &FilterArgs) -> RecordFilter {
    RecordFilter {
        plate: args.plate.clone(),
        region: args.region.clone(),
        performed_by: args.technician.clone(),
        from: args.from,
        to: args.to,
    }
}

/// Builds the sorted, filtered ledger for a sheet.
pub fn ledger_from_sheet(
    sheet: &Sheet,
    filter: &RecordFilter,
) -> Result<(Vec<MaintenanceRecord>, ImportReport)> {
    let builder = RecordBuilder::from_sheet(sheet)?;
    let (mut records, report) = builder.build();
    ledger::sort_chronologically(&mut records);
    Ok((filter.apply(records), report))
}

fn log_report(report: &ImportReport, kept: usize) {
    info!(
        "Imported {} of {} row(s); {} kept after filters",
        report.imported, report.rows_read, kept
    );
    if report.skipped_without_plate > 0 {
        warn!(
            "Skipped {} row(s) without a plate number",
            report.skipped_without_plate
        );
    }
    if report.unparsed_dates > 0 || report.unparsed_odometers > 0 {
        warn!(
            "Left {} date(s) and {} odometer reading(s) empty because they could not be read",
            report.unparsed_dates, report.unparsed_odometers
        );
    }
    if report.unparsed_serials > 0 {
        warn!(
            "Left {} S.NO value(s) empty because they could not be read",
            report.unparsed_serials
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Cell;
    use chrono::NaiveDate;

    #[test]
    fn ledger_is_sorted_before_filtering() {
        let sheet = Sheet::new(
            vec!["PLAKA".to_string(), "TARİH".to_string(), "BÖLGE".to_string()],
            vec![
                vec![
                    Cell::from_text("B"),
                    Cell::from_text("05.03.2025"),
                    Cell::from_text("İzmir"),
                ],
                vec![Cell::from_text("C"), Cell::Empty, Cell::from_text("İzmir")],
                vec![
                    Cell::from_text("A"),
                    Cell::from_text("20250102"),
                    Cell::from_text("İzmir"),
                ],
                vec![
                    Cell::from_text("D"),
                    Cell::from_text("01.01.2025"),
                    Cell::from_text("Bursa"),
                ],
            ],
        );
        let filter = RecordFilter {
            region: Some("İzmir".to_string()),
            ..RecordFilter::default()
        };
        let (records, report) = ledger_from_sheet(&sheet, &filter).unwrap();
        assert_eq!(report.imported, 4);
        let plates: Vec<_> = records.iter().map(|r| r.plate.as_str()).collect();
        assert_eq!(plates, vec!["A", "B", "C"]);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2025, 1, 2));
    }
}
