// src/process/mod.rs
//! Turning exported sheet CSV into alumni records.

pub mod columns;
pub mod index;
pub mod normalize;
pub mod repair;
pub mod tokenize;
pub mod utils;

pub use columns::{detect_header_row, map_columns, ColumnMap, Field};
pub use index::parse_batch_index;
pub use normalize::{normalize_rows, parse_student_rows};
pub use repair::repair_line_continuations;
pub use tokenize::{tokenize, RawRow};

use crate::model::AlumniRecord;

/// Alumni records from raw batch-sheet text.
pub fn parse_student_text(text: &str, batch: &str) -> Vec<AlumniRecord> {
    parse_student_rows(&tokenize(text), batch)
}
