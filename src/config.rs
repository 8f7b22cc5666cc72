// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};
use tracing::{debug, warn};

const DEFAULT_INDEX_SHEET_ID: &str = "15levddFZV4KJov4wey-osN5Ul4Dzc7UYEH2Gb0Z83i8";
const DEFAULT_EXPORT_BASE: &str = "https://docs.google.com";

/// Runtime settings. Every field has a default, so an empty YAML file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spreadsheet id of the index sheet listing every batch.
    pub index_sheet_id: String,
    /// Grid (tab) id inside the index spreadsheet.
    pub index_gid: String,
    /// Scheme + host the CSV export URLs are built on.
    pub export_base: String,
    pub request_timeout_secs: u64,
    /// Batch sheets fetched at once. 1 keeps fetching sequential.
    pub max_concurrent_fetches: usize,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_sheet_id: DEFAULT_INDEX_SHEET_ID.to_string(),
            index_gid: "0".to_string(),
            export_base: DEFAULT_EXPORT_BASE.to_string(),
            request_timeout_secs: 30,
            max_concurrent_fetches: 1,
            port: 8080,
        }
    }
}

impl Config {
    /// Defaults, overlaid by the YAML file at `path` (if any), overlaid by env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        debug!(?cfg, "loaded config");
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Apply `ALUMNI_*` / `PORT` overrides from `lookup`. Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ALUMNI_INDEX_SHEET_ID") {
            self.index_sheet_id = v;
        }
        if let Some(v) = lookup("ALUMNI_INDEX_GID") {
            self.index_gid = v;
        }
        if let Some(v) = lookup("ALUMNI_EXPORT_BASE") {
            self.export_base = v;
        }
        if let Some(v) = parse_var(&lookup, "ALUMNI_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "ALUMNI_MAX_CONCURRENT_FETCHES") {
            self.max_concurrent_fetches = v;
        }
        if let Some(v) = parse_var(&lookup, "PORT") {
            self.port = v;
        }
        self.max_concurrent_fetches = self.max_concurrent_fetches.max(1);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn sanitized(mut self) -> Self {
        self.max_concurrent_fetches = self.max_concurrent_fetches.max(1);
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
