//! Cell coercion for dates and odometer readings.
//!
//! Every function here is total: malformed input becomes [`Unparseable`]
//! instead of a panic, and the caller decides whether to skip the row, store
//! nothing, or warn.

use std::{fmt, ops::RangeInclusive, sync::LazyLock};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use thiserror::Error;

/// Sort key given to dates that could not be interpreted, so they order last.
pub const UNPARSED_SORT_KEY: u32 = 99_999_999;

const DISPLAY_FORMAT: &str = "%d.%m.%Y";

/// Years that fit the four-digit display and the `YYYYMMDD` sort key.
const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

// Day-first wherever day and month are ambiguous. Two-digit years come
// first since `%Y` would read `25` as year 25.
const DATE_FORMATS: &[&str] = &[
    "%d.%m.%y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d %m %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%y %H:%M",
    "%d/%m/%y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

static DOTTED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").expect("dotted date pattern is valid")
});

/// A spreadsheet cell before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Wraps delimited-text input, treating blank fields as empty cells.
    pub fn from_text(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Renders the cell the way it reads in a sheet. Whole floats lose their
    /// fractional part so `20251007.0` reads as `20251007`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else if f.is_nan() {
                    String::new()
                } else {
                    f.to_string()
                }
            }
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::DateTime(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Date,
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Date => f.write_str("date"),
            ValueKind::Integer => f.write_str("integer"),
        }
    }
}

/// The single failure of the coercers: the cell could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not interpret '{raw}' as {kind}")]
pub struct Unparseable {
    pub kind: ValueKind,
    pub raw: String,
}

impl Unparseable {
    fn new(kind: ValueKind, cell: &Cell) -> Self {
        Self {
            kind,
            raw: cell.as_text(),
        }
    }
}

pub fn coerce_date(cell: &Cell) -> Result<NaiveDate, Unparseable> {
    interpret_date(cell)
        .filter(|date| SUPPORTED_YEARS.contains(&date.year()))
        .ok_or_else(|| Unparseable::new(ValueKind::Date, cell))
}

fn interpret_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty | Cell::Bool(_) => return None,
        Cell::DateTime(dt) => return Some(dt.date()),
        _ => {}
    }

    let text = cell.as_text();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = DOTTED_DATE.captures(&text)
        && let Some(date) = ymd(&caps[3], &caps[2], &caps[1])
    {
        return Some(date);
    }

    if text.len() == 8
        && text.bytes().all(|b| b.is_ascii_digit())
        && let Some(date) = ymd(&text[0..4], &text[4..6], &text[6..8])
    {
        return Some(date);
    }

    parse_general_date(&text)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_general_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Renders a date as `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// `YYYYMMDD` as an integer.
pub fn date_sort_key(date: NaiveDate) -> u32 {
    // coerce_date only yields years in SUPPORTED_YEARS.
    let year = u32::try_from(date.year()).unwrap_or(0);
    year * 10_000 + date.month() * 100 + date.day()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDisplay {
    pub text: String,
    pub sort_key: u32,
}

impl DateDisplay {
    pub fn is_parsed(&self) -> bool {
        self.sort_key != UNPARSED_SORT_KEY
    }
}

/// Display text and sort key for a date cell. Unreadable cells keep their
/// text (or `-` when empty) and sort last.
pub fn display_date(cell: &Cell) -> DateDisplay {
    match coerce_date(cell) {
        Ok(date) => DateDisplay {
            text: format_date(date),
            sort_key: date_sort_key(date),
        },
        Err(err) => DateDisplay {
            text: if err.raw.is_empty() {
                "-".to_string()
            } else {
                err.raw
            },
            sort_key: UNPARSED_SORT_KEY,
        },
    }
}

pub fn coerce_integer(cell: &Cell) -> Result<u64, Unparseable> {
    let fail = || Unparseable::new(ValueKind::Integer, cell);
    match cell {
        Cell::Integer(i) => u64::try_from(*i).map_err(|_| fail()),
        Cell::Float(f) => {
            let truncated = f.trunc();
            if truncated.is_finite() && truncated >= 0.0 && truncated < u64::MAX as f64 {
                Ok(truncated as u64)
            } else {
                Err(fail())
            }
        }
        Cell::Text(text) => {
            let digits: String = text
                .chars()
                .filter(|ch| !matches!(ch, '.' | ',') && !ch.is_whitespace())
                .collect();
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail());
            }
            digits.parse().map_err(|_| fail())
        }
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) => Err(fail()),
    }
}

/// Renders `value` with `.` between each group of three digits.
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// Odometer presentation: missing or zero readings show as `-`.
pub fn display_odometer(value: Option<u64>) -> String {
    match value {
        Some(km) if km > 0 => format_grouped(km),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn dotted_dates_are_validated() {
        assert_eq!(coerce_date(&text("07.10.2025")).unwrap(), date(2025, 10, 7));
        assert!(coerce_date(&text("31.02.2025")).is_err());
    }

    #[test]
    fn eight_digit_dates_read_year_first() {
        assert_eq!(coerce_date(&text("20251007")).unwrap(), date(2025, 10, 7));
        assert_eq!(coerce_date(&Cell::Integer(20251007)).unwrap(), date(2025, 10, 7));
        assert_eq!(coerce_date(&Cell::Float(20251007.0)).unwrap(), date(2025, 10, 7));
        assert!(coerce_date(&text("20251307")).is_err());
    }

    #[test]
    fn ambiguous_slashed_dates_are_day_first() {
        assert_eq!(coerce_date(&text("7/10/2025")).unwrap(), date(2025, 10, 7));
        assert_eq!(coerce_date(&text("01/02/2025")).unwrap(), date(2025, 2, 1));
        assert_eq!(coerce_date(&text("2025-10-07")).unwrap(), date(2025, 10, 7));
        assert_eq!(
            coerce_date(&text("07.10.2025 14:30:00")).unwrap(),
            date(2025, 10, 7)
        );
    }

    #[test]
    fn two_digit_years_land_in_this_century() {
        assert_eq!(coerce_date(&text("01/02/25")).unwrap(), date(2025, 2, 1));
        assert_eq!(coerce_date(&text("7.10.25")).unwrap(), date(2025, 10, 7));
        assert_eq!(coerce_date(&text("15-03-24")).unwrap(), date(2024, 3, 15));
        assert_eq!(
            coerce_date(&text("07.10.25 14:30")).unwrap(),
            date(2025, 10, 7)
        );
        let shown = display_date(&text("01/02/25"));
        assert_eq!(shown.text, "01.02.2025");
        assert_eq!(shown.sort_key, 20250201);
    }

    #[test]
    fn years_outside_four_digits_are_unparseable() {
        assert!(coerce_date(&text("-0005-01-01")).is_err());
        assert!(coerce_date(&text("00000101")).is_err());
        assert!(coerce_date(&text("01.01.0000")).is_err());
        assert!(coerce_date(&Cell::Integer(101)).is_err());
        let shown = display_date(&text("-0005-01-01"));
        assert_eq!(shown.text, "-0005-01-01");
        assert_eq!(shown.sort_key, UNPARSED_SORT_KEY);
    }

    #[test]
    fn rfc3339_timestamps_keep_their_local_date() {
        assert_eq!(
            coerce_date(&text("2025-10-07T14:30:00Z")).unwrap(),
            date(2025, 10, 7)
        );
        assert_eq!(
            coerce_date(&text("2025-10-07T23:30:00+03:00")).unwrap(),
            date(2025, 10, 7)
        );
    }

    #[test]
    fn native_datetime_cells_keep_their_date() {
        let dt = date(2024, 3, 9).and_hms_opt(8, 15, 0).unwrap();
        assert_eq!(coerce_date(&Cell::DateTime(dt)).unwrap(), date(2024, 3, 9));
    }

    #[test]
    fn empty_and_garbage_dates_are_unparseable() {
        assert!(coerce_date(&Cell::Empty).is_err());
        assert!(coerce_date(&text("   ")).is_err());
        assert!(coerce_date(&text("yarın")).is_err());
        assert!(coerce_date(&Cell::Bool(true)).is_err());
        let err = coerce_date(&text("abc")).unwrap_err();
        assert_eq!(err.kind, ValueKind::Date);
        assert_eq!(err.to_string(), "could not interpret 'abc' as date");
    }

    #[test]
    fn display_date_sorts_failures_last() {
        let ok = display_date(&text("20251007"));
        assert_eq!(ok.text, "07.10.2025");
        assert_eq!(ok.sort_key, 20251007);
        assert!(ok.is_parsed());

        let empty = display_date(&Cell::Empty);
        assert_eq!(empty.text, "-");
        assert_eq!(empty.sort_key, UNPARSED_SORT_KEY);

        let garbage = display_date(&text(" bilinmiyor "));
        assert_eq!(garbage.text, "bilinmiyor");
        assert!(!garbage.is_parsed());
    }

    #[test]
    fn integers_ignore_grouping_noise() {
        assert_eq!(coerce_integer(&text("12.500")).unwrap(), 12_500);
        assert_eq!(coerce_integer(&text(" 1,250,000 ")).unwrap(), 1_250_000);
        assert_eq!(coerce_integer(&text("98 765")).unwrap(), 98_765);
        assert_eq!(coerce_integer(&Cell::Float(15000.9)).unwrap(), 15_000);
        assert_eq!(coerce_integer(&Cell::Integer(42)).unwrap(), 42);
    }

    #[test]
    fn integers_reject_non_numeric_input() {
        assert!(coerce_integer(&text("abc")).is_err());
        assert!(coerce_integer(&text("12km")).is_err());
        assert!(coerce_integer(&text(".,")).is_err());
        assert!(coerce_integer(&text("-500")).is_err());
        assert!(coerce_integer(&Cell::Integer(-1)).is_err());
        assert!(coerce_integer(&Cell::Float(f64::NAN)).is_err());
        assert!(coerce_integer(&Cell::Empty).is_err());
    }

    #[test]
    fn grouped_formatting_uses_dots() {
        assert_eq!(format_grouped(0), "0");
        assert_eq!(format_grouped(999), "999");
        assert_eq!(format_grouped(1000), "1.000");
        assert_eq!(format_grouped(125_000), "125.000");
        assert_eq!(format_grouped(1_234_567), "1.234.567");
    }

    #[test]
    fn odometer_display_hides_zero() {
        assert_eq!(display_odometer(None), "-");
        assert_eq!(display_odometer(Some(0)), "-");
        assert_eq!(display_odometer(Some(45_300)), "45.300");
    }
}
