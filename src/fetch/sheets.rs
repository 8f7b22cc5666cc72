// src/fetch/sheets.rs

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{redirect::Policy, Client};
use std::{future::Future, time::Duration};
use tracing::debug;
use url::Url;

static SHEET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/d/([a-zA-Z0-9_-]+)").expect("sheet-id regex should be valid"));
static GRID_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gid=(\d+)").expect("gid regex should be valid"));

const MAX_REDIRECTS: usize = 10;

/// CSV export endpoint for one tab of a spreadsheet.
pub fn export_url(base: &str, sheet_id: &str, gid: &str) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "{}/spreadsheets/d/{}/export",
        base.trim_end_matches('/'),
        sheet_id
    ))
    .with_context(|| format!("building export URL on {}", base))?;
    url.query_pairs_mut()
        .append_pair("format", "csv")
        .append_pair("gid", gid);
    Ok(url)
}

/// Export endpoint for an arbitrary spreadsheet "view" link. The tab comes from
/// a `gid=` parameter when present, else the first tab.
pub fn sheet_export_url(base: &str, sheet_url: &str) -> Result<Url> {
    let sheet_id = SHEET_ID
        .captures(sheet_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| anyhow!("no sheet id in {}", sheet_url))?;
    let gid = GRID_ID
        .captures(sheet_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("0");
    export_url(base, sheet_id, gid)
}

/// Where sheet CSV comes from.
pub trait SheetSource: Send + Sync {
    fn fetch_csv(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

/// Plain HTTP GET against the public export endpoint. One request, no retries.
#[derive(Debug, Clone)]
pub struct HttpSheetSource {
    client: Client,
}

impl HttpSheetSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl SheetSource for HttpSheetSource {
    async fn fetch_csv(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching sheet csv");
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))
    }
}
