use alumnisync::{
    directory::{self, DirectoryQuery},
    fetch::SheetSource,
    Aggregator, Config, IngestionResult,
};
use anyhow::Result;
use clap::Parser;
use std::{convert::Infallible, env, path::PathBuf, sync::Arc};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, EnvFilter};
use warp::{reply::Reply, Filter, Rejection};

#[derive(Parser, Debug)]
struct Args {
    /// Optional YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "alumni-sync"
    })))
}

/// Fresh ingestion on every call; always answers 200 with `{alumni, batches}`.
async fn fetch_alumni<S: SheetSource + 'static>(
    query: DirectoryQuery,
    aggregator: Arc<Aggregator<S>>,
) -> Result<impl Reply, Infallible> {
    let result = aggregator.fetch_alumni().await;
    let alumni = directory::filter(&result.alumni, &query)
        .into_iter()
        .cloned()
        .collect();
    info!(q = ?query.q, batch = ?query.batch, "served alumni");
    Ok(warp::reply::json(&IngestionResult {
        alumni,
        batches: result.batches,
    }))
}

async fn alumni_stats<S: SheetSource + 'static>(
    aggregator: Arc<Aggregator<S>>,
) -> Result<impl Reply, Infallible> {
    let result = aggregator.fetch_alumni().await;
    Ok(warp::reply::json(&directory::batch_stats(&result.alumni)))
}

fn with_aggregator<S: SheetSource + 'static>(
    aggregator: Arc<Aggregator<S>>,
) -> impl Filter<Extract = (Arc<Aggregator<S>>,), Error = Infallible> + Clone {
    warp::any().map(move || aggregator.clone())
}

/// `/health`, `/alumni` and `/alumni/stats`, with CORS and request tracing.
fn routes<S: SheetSource + 'static>(
    aggregator: Arc<Aggregator<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let alumni = warp::path("alumni")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<DirectoryQuery>())
        .and(with_aggregator(aggregator.clone()))
        .and_then(fetch_alumni::<S>);

    let stats = warp::path!("alumni" / "stats")
        .and(warp::get())
        .and(with_aggregator(aggregator))
        .and_then(alumni_stats::<S>);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["authorization", "x-client-info", "apikey", "content-type"])
        .allow_methods(vec!["GET", "OPTIONS"]);

    health
        .or(alumni)
        .or(stats)
        .with(cors)
        .with(warp::trace::request())
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(LevelFilter::INFO.into())),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let aggregator = Arc::new(Aggregator::from_config(&config)?);

    info!("Starting alumni sync service");
    info!("Server starting on port {}", config.port);
    info!("Alumni endpoint: GET http://localhost:{}/alumni", config.port);

    warp::serve(routes(aggregator)).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
