use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use log::info;

use crate::{
    cli::StatsArgs,
    coerce,
    import::{ledger_from_sheet, record_filter},
    ledger::{GroupCount, LedgerStats, VehicleSummary},
    load_sheet,
    table::{self, Align},
};

pub fn execute(args: &StatsArgs) -> Result<()> {
    let sheet = load_sheet(&args.input)?;
    let (records, _) = ledger_from_sheet(&sheet, &record_filter(&args.filter))?;
    let today = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let stats = LedgerStats::compute(&records, args.due_threshold, today);

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&stats).context("Serializing statistics to JSON")?;
        println!("{rendered}");
    } else {
        let (headers, rows) = stats_rows(&stats);
        table::print_table(&headers, &rows, &[Align::Left, Align::Right]);
        if !stats.top_vehicles.is_empty() {
            println!();
            let (headers, rows) = vehicle_rows(&stats.top_vehicles);
            table::print_table(&headers, &rows, &[Align::Left, Align::Right, Align::Left]);
        }
        for (label, groups) in [("region", &stats.by_region), ("technician", &stats.by_technician)]
        {
            if groups.is_empty() {
                continue;
            }
            println!();
            let (headers, rows) = group_rows(label, groups);
            table::print_table(&headers, &rows, &[Align::Left, Align::Right]);
        }
    }
    info!("Summarised {} record(s)", stats.total_records);
    Ok(())
}

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map(coerce::format_date)
        .unwrap_or_else(|| "-".to_string())
}

pub fn stats_rows(stats: &LedgerStats) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let most_serviced = stats
        .most_serviced
        .as_ref()
        .map(|m| format!("{} ({})", m.plate, m.services))
        .unwrap_or_else(|| "-".to_string());
    let rows = vec![
        vec!["records".to_string(), stats.total_records.to_string()],
        vec!["vehicles".to_string(), stats.distinct_plates.to_string()],
        vec!["most_serviced".to_string(), most_serviced],
        vec!["latest_service".to_string(), date_or_dash(stats.latest_service)],
        vec!["due_for_service".to_string(), stats.due_for_service.to_string()],
        vec!["this_month".to_string(), stats.this_month.to_string()],
        vec!["last_7_days".to_string(), stats.last_7_days.to_string()],
    ];
    (headers, rows)
}

pub fn vehicle_rows(vehicles: &[VehicleSummary]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "plate".to_string(),
        "services".to_string(),
        "last_service".to_string(),
    ];
    let rows = vehicles
        .iter()
        .map(|v| {
            vec![
                v.plate.clone(),
                v.services.to_string(),
                date_or_dash(v.last_service),
            ]
        })
        .collect();
    (headers, rows)
}

pub fn group_rows(label: &str, groups: &[GroupCount]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![label.to_string(), "services".to_string()];
    let rows = groups
        .iter()
        .map(|g| vec![g.name.clone(), g.services.to_string()])
        .collect();
    (headers, rows)
}
