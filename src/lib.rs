//! Alumni directory ingestion: pulls the batch index and per-batch sheets from
//! the public spreadsheet export endpoint and normalizes them into one list.

pub mod config;
pub mod directory;
pub mod fetch;
pub mod ingest;
pub mod model;
pub mod process;

pub use config::Config;
pub use ingest::Aggregator;
pub use model::{AlumniRecord, BatchReference, IngestionResult};
