// src/process/repair.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RECORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+,").expect("record-start regex should be valid"));

/// Rejoin physical lines that the sheet export hard-wrapped (usually long URL cells).
///
/// A line is folded onto the previous one when it is non-empty, holds no comma,
/// and does not open like a record (`word,`). Nothing is inserted at the join.
/// A short wrapped fragment that happens to contain a comma is left alone.
pub fn repair_line_continuations(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut joined = 0usize;
    let mut i = 0;

    while i < lines.len() {
        let mut line = lines[i].to_string();
        while let Some(next) = lines.get(i + 1) {
            if !is_continuation(next) {
                break;
            }
            if line.ends_with('\r') {
                line.pop();
            }
            line.push_str(next);
            joined += 1;
            i += 1;
        }
        out.push(line);
        i += 1;
    }

    if joined > 0 {
        debug!(joined, "rejoined wrapped lines");
    }
    out.join("\n")
}

fn is_continuation(line: &str) -> bool {
    let content = line.trim_end_matches('\r');
    !content.is_empty() && !content.contains(',') && !RECORD_START.is_match(content)
}
