// src/model.rs

use serde::{Deserialize, Serialize};

/// Batch label used when the sheet itself does not say which cohort a row belongs to.
pub const UNKNOWN_BATCH: &str = "Unknown";

/// One per-batch data source discovered in the index sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReference {
    pub batch_label: String,
    pub sheet_url: String,
}

/// A single normalized alumni entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniRecord {
    pub roll_no: String,
    pub name: String,
    pub email: String,
    pub batch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// What one ingestion run hands back to callers: `{ alumni, batches }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResult {
    pub alumni: Vec<AlumniRecord>,
    /// Distinct batch labels, descending.
    pub batches: Vec<String>,
}

impl IngestionResult {
    /// Build a result from records, deriving the distinct batch labels they carry.
    pub fn from_records(alumni: Vec<AlumniRecord>) -> Self {
        let mut batches: Vec<String> = alumni.iter().map(|a| a.batch.clone()).collect();
        batches.sort_unstable_by(|a, b| b.cmp(a));
        batches.dedup();
        Self { alumni, batches }
    }

    /// Built-in sample served when nothing usable could be ingested.
    pub fn fallback() -> Self {
        let sample = |roll_no: &str, name: &str, email: &str| AlumniRecord {
            roll_no: roll_no.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            batch: "2020".to_string(),
            photo: None,
            linkedin: None,
            status: None,
        };

        Self {
            alumni: vec![
                sample("20891A1201", "John Smith", "john@example.com"),
                sample("20891A1202", "Jane Doe", "jane@example.com"),
                sample("20891A1203", "Michael Johnson", "michael@example.com"),
            ],
            batches: vec!["2020".to_string()],
        }
    }
}
