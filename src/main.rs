use alumnisync::{
    directory::{self, DirectoryQuery},
    Aggregator, Config, IngestionResult,
};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Fetch the alumni directory once and print it as JSON.
#[derive(Parser, Debug)]
struct Args {
    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only records whose name, roll number, email or status contains this text
    #[arg(long)]
    query: Option<String>,

    /// Only records from this batch ("All" for every batch)
    #[arg(long)]
    batch: Option<String>,

    /// Print per-batch counts instead of records
    #[arg(long)]
    stats: bool,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logs go to stderr so stdout stays clean JSON
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    info!(index = %config.index_sheet_id, "startup");

    let aggregator = Aggregator::from_config(&config)?;
    let result = aggregator.fetch_alumni().await;

    let output = if args.stats {
        serde_json::to_value(directory::batch_stats(&result.alumni))?
    } else {
        let query = DirectoryQuery {
            q: args.query,
            batch: args.batch,
        };
        let alumni = directory::filter(&result.alumni, &query)
            .into_iter()
            .cloned()
            .collect();
        serde_json::to_value(IngestionResult {
            alumni,
            batches: result.batches,
        })?
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);
    Ok(())
}
