//! Header mapping report.
//!
//! Lists every column of the input with its normalized spelling and the
//! canonical field it binds to, then names the canonical fields that found
//! no column.

use anyhow::Result;
use log::{info, warn};

use crate::{
    cli::HeadersArgs,
    fields::{CanonicalField, HeaderMapping, normalize_header, normalize_headers},
    load_sheet,
    table::{self, Align},
};

pub fn execute(args: &HeadersArgs) -> Result<()> {
    let sheet = load_sheet(&args.input)?;
    let mapping = normalize_headers(&sheet.headers);
    let (headers, rows) = mapping_report(&sheet.headers, &mapping);
    table::print_table(&headers, &rows, &[Align::Right]);

    let missing = unmatched_fields(&mapping);
    if missing.contains(&CanonicalField::PlateNumber) {
        warn!(
            "No column matches {}; import will refuse this sheet",
            CanonicalField::PlateNumber.label()
        );
    }
    if !missing.is_empty() {
        info!(
            "Unmatched fields: {}",
            missing
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    info!(
        "Matched {} of {} column(s)",
        mapping.len(),
        sheet.headers.len()
    );
    Ok(())
}

pub fn mapping_report(headers: &[String], mapping: &HeaderMapping) -> (Vec<String>, Vec<Vec<String>>) {
    let columns = vec![
        "#".to_string(),
        "column".to_string(),
        "normalized".to_string(),
        "field".to_string(),
    ];
    let rows = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            vec![
                (idx + 1).to_string(),
                header.clone(),
                normalize_header(header),
                mapping
                    .field_at(idx)
                    .map(|f| f.as_str().to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    (columns, rows)
}

pub fn unmatched_fields(mapping: &HeaderMapping) -> Vec<CanonicalField> {
    CanonicalField::ALL
        .into_iter()
        .filter(|field| !mapping.contains(*field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_every_column_in_order() {
        let headers = vec![
            "Plaka".to_string(),
            "Renk".to_string(),
            "bakım_tarihi".to_string(),
        ];
        let mapping = normalize_headers(&headers);
        let (_, rows) = mapping_report(&headers, &mapping);
        assert_eq!(rows[0], vec!["1", "Plaka", "PLAKA", "plate_number"]);
        assert_eq!(rows[1], vec!["2", "Renk", "RENK", ""]);
        assert_eq!(rows[2], vec!["3", "bakım_tarihi", "BAKIM TARIHI", "date"]);

        let missing = unmatched_fields(&mapping);
        assert!(missing.contains(&CanonicalField::Region));
        assert!(!missing.contains(&CanonicalField::Date));
    }
}
