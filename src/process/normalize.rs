// src/process/normalize.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, trace};

use super::columns::{map_columns, ColumnMap, Field};
use super::tokenize::RawRow;
use super::utils::{batch_from_roll_no, drive_thumbnail_url, is_drive_url, is_unknown_batch};
use crate::model::{AlumniRecord, UNKNOWN_BATCH};

const MISSING_ROLL_NO: &str = "N/A";
const MISSING_NAME: &str = "Unknown Alumni";

static ROLL_NO_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}[0-9A-Za-z]{4,}$").expect("roll-number shape regex should be valid")
});
static NAME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L} .'\-]+$").expect("name shape regex should be valid")
});

/// Fields pulled out of one data row before defaults are applied.
#[derive(Debug, Default)]
struct RowFields {
    roll_no: String,
    name: String,
    email: String,
    photo: String,
    linkedin: String,
    status: String,
}

impl RowFields {
    fn from_columns(row: &RawRow, map: &ColumnMap) -> Self {
        let cell = |field: Field| {
            map.get(field)
                .and_then(|idx| row.get(idx))
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        Self {
            roll_no: cell(Field::RollNo),
            name: cell(Field::Name),
            email: cell(Field::Email),
            photo: cell(Field::Photo),
            linkedin: cell(Field::LinkedIn),
            status: cell(Field::Status),
        }
    }

    /// Guess each field from the shape of the cell values. Used when the sheet
    /// has no recognisable header.
    fn sniff(row: &RawRow) -> Self {
        let cells: Vec<String> = row.iter().map(|c| c.trim().to_string()).collect();
        let mut out = Self::default();
        let mut taken = vec![false; cells.len()];

        out.roll_no = claim(&cells, &mut taken, looks_like_roll_no);
        out.email = claim(&cells, &mut taken, |c| {
            c.contains('@') && !c.contains(char::is_whitespace)
        });
        out.photo = claim(&cells, &mut taken, is_drive_url);
        out.linkedin = claim(&cells, &mut taken, |c| {
            c.to_lowercase().contains("linkedin.com")
        });
        out.name = claim(&cells, &mut taken, looks_like_name);
        out
    }

    fn is_anonymous(&self) -> bool {
        self.roll_no.is_empty() && self.name.is_empty()
    }

    fn into_record(self, batch: &str) -> AlumniRecord {
        let batch = if is_unknown_batch(batch) {
            batch_from_roll_no(&self.roll_no).unwrap_or_else(|| UNKNOWN_BATCH.to_string())
        } else {
            batch.to_string()
        };

        AlumniRecord {
            roll_no: or_default(self.roll_no, MISSING_ROLL_NO),
            name: or_default(self.name, MISSING_NAME),
            email: self.email,
            batch,
            photo: non_empty(self.photo).map(|p| drive_thumbnail_url(&p)),
            linkedin: non_empty(self.linkedin),
            status: non_empty(self.status),
        }
    }
}

/// First unclaimed non-empty cell satisfying `pred`.
fn claim(cells: &[String], taken: &mut [bool], pred: impl Fn(&str) -> bool) -> String {
    for (i, c) in cells.iter().enumerate() {
        if !taken[i] && !c.is_empty() && pred(c.as_str()) {
            taken[i] = true;
            return c.clone();
        }
    }
    String::new()
}

fn looks_like_roll_no(cell: &str) -> bool {
    ROLL_NO_SHAPE.is_match(cell)
        && (cell.chars().any(|c| c.is_ascii_alphabetic()) || cell.len() >= 8)
}

fn looks_like_name(cell: &str) -> bool {
    NAME_SHAPE.is_match(cell) && cell.chars().filter(|c| c.is_alphabetic()).count() >= 2
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Turn the data rows that follow `header_idx` into alumni records.
///
/// Rows without both a roll number and a name are dropped. When `batch` is
/// empty or `"Unknown"`, each record's batch comes from its roll-number prefix.
///
/// A map with neither identifying column means no header was found, so cell
/// shapes are sniffed starting at `header_idx` itself. That first row only
/// counts as data if it holds a roll number.
pub fn normalize_rows(
    rows: &[RawRow],
    header_idx: usize,
    map: &ColumnMap,
    batch: &str,
) -> Vec<AlumniRecord> {
    let sniffing = map.lacks_identity();
    let first_data = if sniffing {
        debug!(batch, "no identifying headers, sniffing cell shapes");
        header_idx
    } else {
        header_idx + 1
    };

    let mut dropped = 0usize;
    let records: Vec<AlumniRecord> = rows
        .iter()
        .enumerate()
        .skip(first_data)
        .filter_map(|(i, row)| {
            let fields = if sniffing {
                RowFields::sniff(row)
            } else {
                RowFields::from_columns(row, map)
            };
            if sniffing && i == header_idx && fields.roll_no.is_empty() {
                trace!(row = i, "first row has no roll number, treating it as a header");
                return None;
            }
            if fields.is_anonymous() {
                trace!(row = i, "dropping row without roll number or name");
                dropped += 1;
                return None;
            }
            Some(fields.into_record(batch))
        })
        .collect();

    debug!(batch, kept = records.len(), dropped, "normalized rows");
    records
}

/// Header detection, column mapping and normalization for one tokenized sheet.
#[instrument(level = "debug", skip(rows), fields(rows = rows.len()))]
pub fn parse_student_rows(rows: &[RawRow], batch: &str) -> Vec<AlumniRecord> {
    if rows.len() < 2 {
        debug!("sheet has no data rows");
        return Vec::new();
    }
    let (header_idx, map) = map_columns(rows);
    normalize_rows(rows, header_idx, &map, batch)
}
