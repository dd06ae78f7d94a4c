//! Ordering, filtering and summarising maintenance records.

use std::cmp::Reverse;

use chrono::{Datelike, Days, NaiveDate};
use itertools::Itertools;
use serde::Serialize;

use crate::record::MaintenanceRecord;

/// Gap in km between the current and the next service at which a vehicle is
/// flagged as due.
pub const DEFAULT_DUE_THRESHOLD_KM: u64 = 1_000;

/// Oldest service first; undated records last; ties keep input order.
pub fn sort_chronologically(records: &mut [MaintenanceRecord]) {
    records.sort_by_key(|r| (r.date_sort_key(), r.row));
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub plate: Option<String>,
    pub region: Option<String>,
    pub performed_by: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.plate.is_none()
            && self.region.is_none()
            && self.performed_by.is_none()
            && !self.has_date_range()
    }

    fn has_date_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn matches(&self, record: &MaintenanceRecord) -> bool {
        if let Some(needle) = &self.plate
            && !record
                .plate
                .to_lowercase()
                .contains(&needle.to_lowercase())
        {
            return false;
        }
        if let Some(region) = &self.region
            && record.region.as_deref() != Some(region.as_str())
        {
            return false;
        }
        if let Some(technician) = &self.performed_by
            && record.performed_by.as_deref() != Some(technician.as_str())
        {
            return false;
        }
        if self.has_date_range() {
            let Some(date) = record.date else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: Vec<MaintenanceRecord>) -> Vec<MaintenanceRecord> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// True when both readings are known and the next service is at most
/// `threshold` km away.
pub fn service_due(record: &MaintenanceRecord, threshold: u64) -> bool {
    match (record.odometer_at_service, record.odometer_next_service) {
        (Some(current), Some(next)) if current > 0 && next > 0 => {
            next.saturating_sub(current) <= threshold
        }
        _ => false,
    }
}

/// Lengths of [`LedgerStats::top_vehicles`] and [`LedgerStats::by_technician`].
pub const TOP_VEHICLES: usize = 5;
pub const TOP_TECHNICIANS: usize = 10;
const MISSING: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateCount {
    pub plate: String,
    pub services: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleSummary {
    pub plate: String,
    pub services: usize,
    pub last_service: Option<NaiveDate>,
}

/// Records per region or per technician; missing values group under `-`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub name: String,
    pub services: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub total_records: usize,
    pub distinct_plates: usize,
    pub most_serviced: Option<PlateCount>,
    pub latest_service: Option<NaiveDate>,
    pub due_for_service: usize,
    /// Services in the calendar month of the reference day.
    pub this_month: usize,
    /// Services dated on or after seven days before the reference day.
    pub last_7_days: usize,
    pub top_vehicles: Vec<VehicleSummary>,
    pub by_region: Vec<GroupCount>,
    pub by_technician: Vec<GroupCount>,
}

impl LedgerStats {
    /// Summarises `records`, counting recent services relative to `today`.
    pub fn compute(records: &[MaintenanceRecord], due_threshold: u64, today: NaiveDate) -> Self {
        let plates = ranked(records, |r| r.plate.as_str());
        let week_start = today.checked_sub_days(Days::new(7));
        let dates = || records.iter().filter_map(|r| r.date);
        Self {
            total_records: records.len(),
            distinct_plates: plates.len(),
            most_serviced: plates.first().map(|(plate, services)| PlateCount {
                plate: plate.to_string(),
                services: *services,
            }),
            latest_service: dates().max(),
            due_for_service: records
                .iter()
                .filter(|r| service_due(r, due_threshold))
                .count(),
            this_month: dates()
                .filter(|d| d.year() == today.year() && d.month() == today.month())
                .count(),
            last_7_days: dates()
                .filter(|d| week_start.is_some_and(|start| *d >= start))
                .count(),
            top_vehicles: plates
                .iter()
                .take(TOP_VEHICLES)
                .map(|(plate, services)| VehicleSummary {
                    plate: plate.to_string(),
                    services: *services,
                    last_service: records
                        .iter()
                        .filter(|r| r.plate == *plate)
                        .filter_map(|r| r.date)
                        .max(),
                })
                .collect(),
            by_region: group_counts(ranked(records, |r| {
                r.region.as_deref().unwrap_or(MISSING)
            })),
            by_technician: group_counts(
                ranked(records, |r| r.performed_by.as_deref().unwrap_or(MISSING))
                    .into_iter()
                    .take(TOP_TECHNICIANS),
            ),
        }
    }
}

/// Distinct keys by descending count; equal counts keep first-seen order.
fn ranked<'a>(
    records: &'a [MaintenanceRecord],
    key: impl Fn(&'a MaintenanceRecord) -> &'a str,
) -> Vec<(&'a str, usize)> {
    let counts = records.iter().map(&key).counts();
    records
        .iter()
        .map(&key)
        .unique()
        .map(|name| (name, counts[name]))
        .sorted_by_key(|(_, services)| Reverse(*services))
        .collect()
}

fn group_counts<'a>(ranked: impl IntoIterator<Item = (&'a str, usize)>) -> Vec<GroupCount> {
    ranked
        .into_iter()
        .map(|(name, services)| GroupCount {
            name: name.to_string(),
            services,
        })
        .collect()
}
