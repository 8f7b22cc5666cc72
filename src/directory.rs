// src/directory.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::AlumniRecord;

/// Label that selects every batch.
pub const ALL_BATCHES: &str = "All";

/// Free-text search plus an optional batch selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryQuery {
    pub q: Option<String>,
    pub batch: Option<String>,
}

impl DirectoryQuery {
    fn wants_batch(&self, batch: &str) -> bool {
        match self.batch.as_deref().map(str::trim) {
            None | Some("") | Some(ALL_BATCHES) => true,
            Some(wanted) => wanted == batch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchCount {
    pub batch: String,
    pub count: usize,
}

/// Records matching `query`, in their original order. The search text is
/// matched case-insensitively against name, roll number, email and status.
pub fn filter<'a>(records: &'a [AlumniRecord], query: &DirectoryQuery) -> Vec<&'a AlumniRecord> {
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    records
        .iter()
        .filter(|r| query.wants_batch(&r.batch))
        .filter(|r| match &needle {
            None => true,
            Some(n) => [
                Some(r.name.as_str()),
                Some(r.roll_no.as_str()),
                Some(r.email.as_str()),
                r.status.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(n.as_str())),
        })
        .collect()
}

/// Number of records per batch, newest batch label first.
pub fn batch_stats(records: &[AlumniRecord]) -> Vec<BatchCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.batch.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .rev()
        .map(|(batch, count)| BatchCount {
            batch: batch.to_string(),
            count,
        })
        .collect()
}
