//! Canonical maintenance-log columns and spreadsheet header matching.
//!
//! Spreadsheets arrive with headers spelled in many ways (`Plaka`, `ARAÇ NO`,
//! `bakim_tarihi`, `S.NO`). [`normalize_headers()`] folds every header into a
//! comparable form and binds it to one of the fixed [`CanonicalField`]s using
//! the static alias table below.
//!
//! ## Tie breaking
//!
//! Fields are tried in declaration order and, within a field, aliases are
//! tried in declaration order. The first alias that matches an unclaimed
//! header wins and later aliases of that field are ignored. When several
//! columns normalize to the same text, the leftmost unclaimed one is bound.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    SerialNumber,
    PlateNumber,
    Region,
    Date,
    OdometerAtService,
    OdometerNextService,
    WorkPerformed,
    OtherNotes,
    PerformedBy,
    DoorNumber,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::SerialNumber,
        CanonicalField::PlateNumber,
        CanonicalField::Region,
        CanonicalField::Date,
        CanonicalField::OdometerAtService,
        CanonicalField::OdometerNextService,
        CanonicalField::WorkPerformed,
        CanonicalField::OtherNotes,
        CanonicalField::PerformedBy,
        CanonicalField::DoorNumber,
    ];

    /// Column order used by ledger exports.
    pub const EXPORT_ORDER: [CanonicalField; 10] = [
        CanonicalField::SerialNumber,
        CanonicalField::PlateNumber,
        CanonicalField::DoorNumber,
        CanonicalField::Region,
        CanonicalField::Date,
        CanonicalField::OdometerAtService,
        CanonicalField::OdometerNextService,
        CanonicalField::WorkPerformed,
        CanonicalField::OtherNotes,
        CanonicalField::PerformedBy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::SerialNumber => "serial_number",
            CanonicalField::PlateNumber => "plate_number",
            CanonicalField::Region => "region",
            CanonicalField::Date => "date",
            CanonicalField::OdometerAtService => "odometer_at_service",
            CanonicalField::OdometerNextService => "odometer_next_service",
            CanonicalField::WorkPerformed => "work_performed",
            CanonicalField::OtherNotes => "other_notes",
            CanonicalField::PerformedBy => "performed_by",
            CanonicalField::DoorNumber => "door_number",
        }
    }

    /// Header label written to exported ledgers.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::SerialNumber => "S.NO",
            CanonicalField::PlateNumber => "PLAKA",
            CanonicalField::Region => "BÖLGE",
            CanonicalField::Date => "TARİH",
            CanonicalField::OdometerAtService => "BAKIM ESNASINDA KM",
            CanonicalField::OdometerNextService => "BİR SONRAKİ BAKIM KM",
            CanonicalField::WorkPerformed => "YAPILAN İŞLEM",
            CanonicalField::OtherNotes => "DİĞER",
            CanonicalField::PerformedBy => "BAKIMI YAPAN",
            CanonicalField::DoorNumber => "KAPI NUMARASI",
        }
    }

    /// Recognised header spellings, in the order they are tried.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::SerialNumber => &[
                "S.NO", "S NO", "S_NO", "SNO", "SIRA NO", "SIRA", "SAYI",
            ],
            CanonicalField::PlateNumber => &["PLAKA", "ARAÇ PLAKA", "ARAÇ NO", "ARAÇ"],
            CanonicalField::Region => &["BÖLGE", "BÖLGE ADI", "ŞANTİYE"],
            CanonicalField::Date => &["TARİH", "BAKIM TARİHİ", "TARİHİ"],
            CanonicalField::OdometerAtService => &[
                "BAKIM ESNASINDA KM",
                "BAKIMDA KM",
                "BAKIM KM",
                "KM",
            ],
            CanonicalField::OdometerNextService => &[
                "BİR SONRAKİ BAKIM KM",
                "SONRAKİ BAKIM KM",
                "BİR SONRAKİ KM",
                "SONRAKİ KM",
            ],
            CanonicalField::WorkPerformed => &[
                "YAPILAN İŞLEM",
                "YAPILANLAR",
                "YAPILAN",
                "İŞLEM",
            ],
            CanonicalField::OtherNotes => &["DİĞER", "NOTLAR", "NOT", "AÇIKLAMA"],
            CanonicalField::PerformedBy => &[
                "BAKIMI YAPAN",
                "BAKIM YAPAN",
                "TEKNİSYEN ADI",
                "TEKNİSYEN",
                "UYGULAYAN",
            ],
            CanonicalField::DoorNumber => &["KAPI NUMARASI", "KAPI NO", "KAPI"],
        }
    }

    pub fn is_odometer(&self) -> bool {
        matches!(
            self,
            CanonicalField::OdometerAtService | CanonicalField::OdometerNextService
        )
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn fold_accent(ch: char) -> char {
    match ch {
        'İ' | 'Î' => 'I',
        'ı' | 'î' => 'i',
        'Ş' => 'S',
        'ş' => 's',
        'Ğ' => 'G',
        'ğ' => 'g',
        'Ü' | 'Û' => 'U',
        'ü' | 'û' => 'u',
        'Ö' => 'O',
        'ö' => 'o',
        'Ç' => 'C',
        'ç' => 'c',
        'Â' => 'A',
        'â' => 'a',
        other => other,
    }
}

/// Folds a header into the form used for alias comparison.
pub fn normalize_header(value: &str) -> String {
    let folded: String = value
        .trim()
        .chars()
        .map(|ch| match fold_accent(ch) {
            '.' | '_' => ' ',
            other => other,
        })
        .collect();
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderBinding {
    pub field: CanonicalField,
    pub index: usize,
    pub original: String,
}

/// Result of matching one header row against the alias table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMapping {
    bindings: Vec<HeaderBinding>,
}

impl HeaderMapping {
    /// Bindings in canonical field order.
    pub fn bindings(&self) -> &[HeaderBinding] {
        &self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.binding(field).is_some()
    }

    pub fn column_for(&self, field: CanonicalField) -> Option<usize> {
        self.binding(field).map(|b| b.index)
    }

    pub fn label_for(&self, field: CanonicalField) -> Option<&str> {
        self.binding(field).map(|b| b.original.as_str())
    }

    pub fn field_at(&self, index: usize) -> Option<CanonicalField> {
        self.bindings
            .iter()
            .find(|b| b.index == index)
            .map(|b| b.field)
    }

    /// Field bound to the given original header text, if any.
    pub fn field_for(&self, header: &str) -> Option<CanonicalField> {
        self.bindings
            .iter()
            .find(|b| b.original == header)
            .map(|b| b.field)
    }

    /// Rename map from original header text to canonical field.
    pub fn renames(&self) -> BTreeMap<String, CanonicalField> {
        let mut renames = BTreeMap::new();
        for binding in &self.bindings {
            renames
                .entry(binding.original.clone())
                .or_insert(binding.field);
        }
        renames
    }

    fn binding(&self, field: CanonicalField) -> Option<&HeaderBinding> {
        self.bindings.iter().find(|b| b.field == field)
    }
}

pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> HeaderMapping {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect();
    let mut claimed = vec![false; headers.len()];
    let mut bindings = Vec::new();

    for field in CanonicalField::ALL {
        for alias in field.aliases() {
            let key = normalize_header(alias);
            let hit = normalized
                .iter()
                .enumerate()
                .find(|(idx, candidate)| !claimed[*idx] && **candidate == key)
                .map(|(idx, _)| idx);
            if let Some(idx) = hit {
                claimed[idx] = true;
                bindings.push(HeaderBinding {
                    field,
                    index: idx,
                    original: headers[idx].as_ref().to_string(),
                });
                break;
            }
        }
    }

    HeaderMapping { bindings }
}
