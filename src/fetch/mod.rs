// src/fetch/mod.rs

pub mod sheets;

pub use sheets::{export_url, sheet_export_url, HttpSheetSource, SheetSource};
