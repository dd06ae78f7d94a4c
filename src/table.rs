//! Plain-text table rendering for terminal output.
//!
//! Widths count characters rather than bytes so Turkish letters line up, and
//! ANSI colour sequences are ignored when measuring.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{
    coerce,
    fields::CanonicalField,
    ledger,
    record::MaintenanceRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>], aligns: &[Align]) {
    print!("{}", render_table(headers, rows, aligns));
}

/// Ledger view: grouped odometers, `-` for blanks and a `*` on rows whose
/// next service is within `due_threshold` km.
pub fn render_ledger(records: &[MaintenanceRecord], due_threshold: u64) -> String {
    let mut headers = vec!["".to_string()];
    headers.extend(
        CanonicalField::EXPORT_ORDER
            .iter()
            .skip(1)
            .map(|field| field.label().to_string()),
    );
    let mut aligns = vec![Align::Left];
    aligns.extend(CanonicalField::EXPORT_ORDER.iter().skip(1).map(|field| {
        if field.is_odometer() {
            Align::Right
        } else {
            Align::Left
        }
    }));

    let rows = records
        .iter()
        .map(|record| {
            let marker = if ledger::service_due(record, due_threshold) {
                "*"
            } else {
                ""
            };
            let mut row = vec![marker.to_string()];
            row.extend(CanonicalField::EXPORT_ORDER.iter().skip(1).map(|field| match field {
                CanonicalField::Date => record.date_display(),
                CanonicalField::OdometerAtService => {
                    coerce::display_odometer(record.odometer_at_service)
                }
                CanonicalField::OdometerNextService => {
                    coerce::display_odometer(record.odometer_next_service)
                }
                other => record.text(*other).unwrap_or("-").to_string(),
            }));
            row
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows, &aligns)
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        let Some(width) = widths.get(idx).copied() else {
            break;
        };
        let sanitized = sanitize_cell(value);
        let padding = " ".repeat(width.saturating_sub(display_width(sanitized.as_ref())));
        let cell = match aligns.get(idx).copied().unwrap_or_default() {
            Align::Left => format!("{sanitized}{padding}"),
            Align::Right => format!("{padding}{sanitized}"),
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_aligned_columns_pad_on_the_left() {
        let headers = vec!["PLAKA".to_string(), "KM".to_string()];
        let rows = vec![
            vec!["A".to_string(), "1.000".to_string()],
            vec!["BÖLGE".to_string(), "5".to_string()],
        ];
        let rendered = render_table(&headers, &rows, &[Align::Left, Align::Right]);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "PLAKA  KM");
        assert_eq!(lines[1], "-----  -----");
        assert_eq!(lines[2], "A      1.000");
        assert_eq!(lines[3], "BÖLGE      5");
    }

    #[test]
    fn width_ignores_ansi_sequences() {
        assert_eq!(display_width("\u{1b}[31mabc\u{1b}[0m"), 3);
        assert_eq!(display_width("İŞLEM"), 5);
    }

    #[test]
    fn ledger_view_marks_due_rows() {
        let mut record = MaintenanceRecord::new(1, "34 ABC 12");
        record.odometer_at_service = Some(12_500);
        record.odometer_next_service = Some(13_000);
        let rendered = render_ledger(&[record], ledger::DEFAULT_DUE_THRESHOLD_KM);
        let row = rendered.lines().nth(2).unwrap();
        assert!(row.starts_with("*  34 ABC 12"));
        assert!(row.contains("12.500"));
        assert!(row.contains("13.000"));
    }
}
