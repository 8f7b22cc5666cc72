// src/process/columns.rs

use tracing::debug;

use super::tokenize::RawRow;

/// How many leading rows are searched for a header.
const HEADER_SCAN_ROWS: usize = 5;
const HEADER_MARKERS: &[&str] = &["roll", "name"];

/// The semantic fields a batch sheet can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    RollNo,
    Name,
    Email,
    Photo,
    LinkedIn,
    Status,
}

/// Header keyword table, evaluated in order for every header cell.
const FIELD_KEYWORDS: &[(Field, &[&str])] = &[
    (Field::RollNo, &["roll", "no"]),
    (Field::Name, &["name"]),
    (Field::Email, &["email"]),
    (Field::Photo, &["photo"]),
    (Field::LinkedIn, &["linkedin"]),
    (Field::Status, &["status", "current", "position"]),
];

/// Column index per semantic field; `None` when no header cell matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub roll_no: Option<usize>,
    pub name: Option<usize>,
    pub email: Option<usize>,
    pub photo: Option<usize>,
    pub linkedin: Option<usize>,
    pub status: Option<usize>,
}

impl ColumnMap {
    /// Map header cells to fields by keyword substring. Scans left to right, so
    /// a later matching column replaces an earlier one.
    pub fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (idx, cell) in headers.iter().enumerate() {
            let cell = cell.trim().to_lowercase();
            for (field, keywords) in FIELD_KEYWORDS {
                if keywords.iter().any(|k| cell.contains(k)) {
                    *map.slot_mut(*field) = Some(idx);
                }
            }
        }
        map
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        match field {
            Field::RollNo => self.roll_no,
            Field::Name => self.name,
            Field::Email => self.email,
            Field::Photo => self.photo,
            Field::LinkedIn => self.linkedin,
            Field::Status => self.status,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::RollNo => &mut self.roll_no,
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Photo => &mut self.photo,
            Field::LinkedIn => &mut self.linkedin,
            Field::Status => &mut self.status,
        }
    }

    /// True when neither identifying column was found.
    pub fn lacks_identity(&self) -> bool {
        self.roll_no.is_none() && self.name.is_none()
    }
}

/// Index of the first of the leading rows that mentions "roll" or "name"; row 0 otherwise.
pub fn detect_header_row(rows: &[RawRow]) -> usize {
    rows.iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let joined = row.join(",").to_lowercase();
            HEADER_MARKERS.iter().any(|m| joined.contains(m))
        })
        .unwrap_or(0)
}

/// Locate the header and build the column map for one batch sheet.
pub fn map_columns(rows: &[RawRow]) -> (usize, ColumnMap) {
    let header_idx = detect_header_row(rows);
    let map = rows
        .get(header_idx)
        .map(|h| ColumnMap::from_headers(h))
        .unwrap_or_default();
    debug!(header_idx, ?map, "mapped columns");
    (header_idx, map)
}
