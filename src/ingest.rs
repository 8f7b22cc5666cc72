// src/ingest.rs

use anyhow::{Context, Result};
use futures::{stream, StreamExt};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::fetch::sheets::{export_url, sheet_export_url, HttpSheetSource, SheetSource};
use crate::model::{AlumniRecord, BatchReference, IngestionResult, UNKNOWN_BATCH};
use crate::process::{parse_batch_index, parse_student_text, repair_line_continuations, tokenize};

/// Drives one ingestion: index sheet, then every batch sheet it lists.
pub struct Aggregator<S> {
    source: S,
    export_base: String,
    index_sheet_id: String,
    index_gid: String,
    max_concurrent_fetches: usize,
}

impl Aggregator<HttpSheetSource> {
    /// HTTP-backed aggregator configured from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpSheetSource::new(config.request_timeout())?;
        Ok(Self::new(source, config))
    }
}

impl<S: SheetSource> Aggregator<S> {
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            export_base: config.export_base.clone(),
            index_sheet_id: config.index_sheet_id.clone(),
            index_gid: config.index_gid.clone(),
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        }
    }

    /// Fetch every alumni record. Never fails: if nothing usable can be
    /// ingested the built-in sample is returned instead.
    #[instrument(level = "info", skip(self), fields(index = %self.index_sheet_id))]
    pub async fn fetch_alumni(&self) -> IngestionResult {
        let start = Instant::now();
        match self.try_fetch_alumni().await {
            Ok(Some(result)) => {
                info!(
                    alumni = result.alumni.len(),
                    batches = result.batches.len(),
                    elapsed = ?start.elapsed(),
                    "ingestion complete"
                );
                result
            }
            Ok(None) => {
                warn!("no batches and no direct data in index sheet, serving fallback");
                IngestionResult::fallback()
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "index sheet unavailable, serving fallback");
                IngestionResult::fallback()
            }
        }
    }

    /// `Ok(None)` means the index held neither batch links nor student rows.
    async fn try_fetch_alumni(&self) -> Result<Option<IngestionResult>> {
        let index_url = export_url(&self.export_base, &self.index_sheet_id, &self.index_gid)?;
        let raw = self
            .source
            .fetch_csv(&index_url)
            .await
            .context("fetching index sheet")?;
        debug!(bytes = raw.len(), "index sheet received");

        let index_text = repair_line_continuations(&raw);
        let batches = parse_batch_index(&tokenize(&index_text));
        info!(
            count = batches.len(),
            labels = ?batches.iter().map(|b| b.batch_label.as_str()).collect::<Vec<_>>(),
            "found batches"
        );

        if batches.is_empty() {
            debug!("treating index sheet as a direct data sheet");
            let direct = parse_student_text(&index_text, UNKNOWN_BATCH);
            if direct.is_empty() {
                return Ok(None);
            }
            return Ok(Some(IngestionResult::from_records(direct)));
        }

        let alumni = self.fetch_batches(&batches).await;
        Ok(Some(IngestionResult::from_records(alumni)))
    }

    /// Fetch and parse every batch, at most `max_concurrent_fetches` at a time.
    /// Output keeps the index order; a failed batch contributes nothing.
    async fn fetch_batches(&self, batches: &[BatchReference]) -> Vec<AlumniRecord> {
        let per_batch: Vec<Vec<AlumniRecord>> = stream::iter(batches.iter().cloned())
            .map(|batch| async move {
                match self.fetch_batch(&batch).await {
                    Ok(students) => {
                        info!(
                            batch = %batch.batch_label,
                            students = students.len(),
                            "fetched batch"
                        );
                        students
                    }
                    Err(e) => {
                        warn!(
                            batch = %batch.batch_label,
                            error = %format!("{:#}", e),
                            "skipping batch"
                        );
                        Vec::new()
                    }
                }
            })
            .buffered(self.max_concurrent_fetches)
            .collect()
            .await;

        per_batch.into_iter().flatten().collect()
    }

    #[instrument(level = "debug", skip(self, batch), fields(batch = %batch.batch_label))]
    async fn fetch_batch(&self, batch: &BatchReference) -> Result<Vec<AlumniRecord>> {
        let url = sheet_export_url(&self.export_base, &batch.sheet_url)?;
        let csv = self.source.fetch_csv(&url).await?;
        Ok(parse_student_text(&csv, &batch.batch_label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tracing_subscriber::{fmt, EnvFilter};
    use url::Url;

    const BASE: &str = "http://sheets.test";

    fn init_logging() {
        let _ = fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    }

    /// Serves canned CSV keyed by export URL; unknown URLs behave like a 404.
    #[derive(Default)]
    struct MemorySource {
        pages: HashMap<String, String>,
        delays: HashMap<String, Duration>,
        requested: Mutex<Vec<String>>,
    }

    impl MemorySource {
        fn with_page(mut self, sheet_id: &str, gid: &str, csv: &str) -> Self {
            let url = export_url(BASE, sheet_id, gid).unwrap();
            self.pages.insert(url.to_string(), csv.to_string());
            self
        }

        fn with_delay(mut self, sheet_id: &str, delay: Duration) -> Self {
            let url = export_url(BASE, sheet_id, "0").unwrap();
            self.delays.insert(url.to_string(), delay);
            self
        }
    }

    impl SheetSource for MemorySource {
        async fn fetch_csv(&self, url: &Url) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            if let Some(d) = self.delays.get(url.as_str()) {
                tokio::time::sleep(*d).await;
            }
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found) for {}", url))
        }
    }

    fn config(concurrency: usize) -> Config {
        Config {
            index_sheet_id: "INDEX".into(),
            export_base: BASE.into(),
            max_concurrent_fetches: concurrency,
            ..Config::default()
        }
    }

    fn index_csv(rows: &[(&str, &str)]) -> String {
        let mut csv = String::from("Batch,Sheet Link\n");
        for (label, id) in rows {
            csv.push_str(&format!(
                "{},https://docs.google.com/spreadsheets/d/{}/edit#gid=0\n",
                label, id
            ));
        }
        csv
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn fetch_future_can_be_spawned() {
        let agg = Aggregator::new(MemorySource::default(), &config(2));
        let fut = agg.fetch_alumni();
        assert_send(&fut);
    }

    #[tokio::test]
    async fn fetch_runs_inside_spawned_task() {
        let source = MemorySource::default()
            .with_page("INDEX", "0", &index_csv(&[("2021", "B2021")]))
            .with_page("B2021", "0", "Roll No,Name\n21891A1201,Deepa\n");
        let agg = std::sync::Arc::new(Aggregator::new(source, &config(2)));

        let handle = tokio::spawn({
            let agg = agg.clone();
            async move { agg.fetch_alumni().await }
        });
        let result = handle.await.unwrap();
        assert_eq!(result.alumni.len(), 1);
        assert_eq!(result.batches, vec!["2021"]);
    }

    #[tokio::test]
    async fn header_below_title_rows_end_to_end() {
        init_logging();
        let source = MemorySource::default()
            .with_page("INDEX", "0", &index_csv(&[("2020", "B2020")]))
            .with_page(
                "B2020",
                "0",
                "IT Department,,,\n\
                 Alumni of 2020,,,\n\
                 S.No,Roll Number,Student Name,Email ID\n\
                 1,20891A1201,Asha Rao,asha@example.com\n\
                 2,,,orphan@example.com\n\
                 3,20891A1203,Chitra,\n",
            );

        let result = Aggregator::new(source, &config(1)).fetch_alumni().await;
        assert_eq!(result.alumni.len(), 2);
        assert!(result.alumni.iter().all(|a| a.batch == "2020"));
        assert_eq!(result.alumni[0].name, "Asha Rao");
        assert_eq!(result.alumni[1].roll_no, "20891A1203");
        assert_eq!(result.batches, vec!["2020"]);
    }

    #[tokio::test]
    async fn missing_index_serves_fallback() {
        init_logging();
        let result = Aggregator::new(MemorySource::default(), &config(1))
            .fetch_alumni()
            .await;
        assert_eq!(result, IngestionResult::fallback());
    }

    #[tokio::test]
    async fn index_without_batches_or_students_serves_fallback() {
        let source = MemorySource::default().with_page("INDEX", "0", "Batch,Sheet Link\n");
        let result = Aggregator::new(source, &config(1)).fetch_alumni().await;
        assert_eq!(result, IngestionResult::fallback());
    }

    #[tokio::test]
    async fn failed_batch_is_skipped_and_others_kept() {
        init_logging();
        let source = MemorySource::default()
            .with_page(
                "INDEX",
                "0",
                &index_csv(&[("2021", "B2021"), ("2020", "GONE"), ("2019", "B2019")]),
            )
            .with_page("B2021", "0", "Roll No,Name\n21891A1201,Deepa\n")
            .with_page("B2019", "0", "Roll No,Name\n19891A1201,Ezhil\n");

        let result = Aggregator::new(source, &config(1)).fetch_alumni().await;
        let names: Vec<&str> = result.alumni.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Deepa", "Ezhil"]);
        assert_eq!(result.batches, vec!["2021", "2019"]);
    }

    #[tokio::test]
    async fn wrapped_index_links_are_repaired() {
        let index = "Batch,Sheet Link\n2022,https://docs.google.com/spreadsheets/d/B20\n22/edit\n";
        let source = MemorySource::default()
            .with_page("INDEX", "0", index)
            .with_page("B2022", "0", "Roll No,Name\n22891A1201,Farah\n");

        let result = Aggregator::new(source, &config(1)).fetch_alumni().await;
        assert_eq!(result.alumni.len(), 1);
        assert_eq!(result.alumni[0].batch, "2022");
    }

    #[tokio::test]
    async fn index_that_is_a_data_sheet_is_parsed_directly() {
        let source = MemorySource::default().with_page(
            "INDEX",
            "0",
            "Roll No,Name,Email\n\
             19891A1201,Gita,g@example.com\n\
             21891A1202,Hari,h@example.com\n\
             XYZ,Indu,\n",
        );

        let result = Aggregator::new(source, &config(1)).fetch_alumni().await;
        assert_eq!(result.alumni.len(), 3);
        assert_eq!(result.alumni[0].batch, "2019");
        assert_eq!(result.alumni[1].batch, "2021");
        assert_eq!(result.alumni[2].batch, "Unknown");
        assert_eq!(result.batches, vec!["Unknown", "2021", "2019"]);
    }

    #[tokio::test]
    async fn all_batches_failing_gives_empty_result() {
        let source =
            MemorySource::default().with_page("INDEX", "0", &index_csv(&[("2020", "GONE")]));
        let result = Aggregator::new(source, &config(1)).fetch_alumni().await;
        assert!(result.alumni.is_empty());
        assert!(result.batches.is_empty());
    }

    #[tokio::test]
    async fn concurrent_fetches_keep_index_order() {
        let source = MemorySource::default()
            .with_page("INDEX", "0", &index_csv(&[("2019", "SLOW"), ("2020", "FAST")]))
            .with_page("SLOW", "0", "Roll No,Name\n19891A1201,Slow One\n")
            .with_page("FAST", "0", "Roll No,Name\n20891A1201,Fast One\n")
            .with_delay("SLOW", Duration::from_millis(50));

        let agg = Aggregator::new(source, &config(4));
        let result = agg.fetch_alumni().await;
        let names: Vec<&str> = result.alumni.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Slow One", "Fast One"]);
        assert_eq!(agg.source.requested.lock().unwrap().len(), 3);
    }
}
