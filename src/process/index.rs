// src/process/index.rs

use tracing::{debug, trace};

use super::tokenize::RawRow;
use crate::model::BatchReference;

const SPREADSHEET_HOST: &str = "docs.google.com";
const SHEET_PATH_MARKER: &str = "/d/";

/// Read `(batch label, sheet url)` pairs from the tokenized index sheet.
///
/// Row 0 is the header. Column 0 is the label, column 1 the link. Rows with
/// an empty label, an empty link, or a link that is not a spreadsheet are skipped.
pub fn parse_batch_index(rows: &[RawRow]) -> Vec<BatchReference> {
    let mut batches = Vec::new();

    for (i, row) in rows.iter().enumerate().skip(1) {
        let batch_label = row.first().map(|s| s.trim()).unwrap_or_default();
        let sheet_url = row.get(1).map(|s| s.trim()).unwrap_or_default();

        if batch_label.is_empty() || !is_spreadsheet_url(sheet_url) {
            trace!(row = i, batch = batch_label, "skipping index row");
            continue;
        }

        debug!(row = i, batch = batch_label, "found batch");
        batches.push(BatchReference {
            batch_label: batch_label.to_string(),
            sheet_url: sheet_url.to_string(),
        });
    }

    batches
}

fn is_spreadsheet_url(url: &str) -> bool {
    !url.is_empty() && url.contains(SPREADSHEET_HOST) && url.contains(SHEET_PATH_MARKER)
}
