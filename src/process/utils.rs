// src/process/utils.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::UNKNOWN_BATCH;

static ROLL_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})").expect("roll-year regex should be valid"));
static DRIVE_FILE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\w]{25,}").expect("drive-id regex should be valid"));

const DRIVE_HOSTS: &[&str] = &["drive.google.com", "docs.google.com"];

/// True for the placeholder label (or an empty one) that asks for derivation.
pub fn is_unknown_batch(batch: &str) -> bool {
    batch.is_empty() || batch == UNKNOWN_BATCH
}

/// `"20891A1201"` → `Some("2020")`. Roll numbers open with the two-digit intake year.
pub fn batch_from_roll_no(roll_no: &str) -> Option<String> {
    ROLL_YEAR
        .captures(roll_no)
        .map(|caps| format!("20{}", &caps[1]))
}

pub fn is_drive_url(url: &str) -> bool {
    DRIVE_HOSTS.iter().any(|h| url.contains(h))
}

/// Rewrite a shared-drive link to its direct thumbnail endpoint.
/// Anything else, or a drive link with no file id, is returned unchanged.
pub fn drive_thumbnail_url(url: &str) -> String {
    if !is_drive_url(url) {
        return url.to_string();
    }
    match DRIVE_FILE_ID.find(url) {
        Some(id) => format!(
            "https://drive.google.com/thumbnail?id={}&sz=w1000",
            id.as_str()
        ),
        None => url.to_string(),
    }
}
