//! Aviation weather recorder utility

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tracing::info;

use avwx_recorder::{
    batch,
    config::AppConfig,
    errors::AvwxError,
    feed::FeedClientBuilder,
    ingest::StreamIngestor,
    models::{Pirep, StationReport},
    query::{self, BoundingBox},
    snapshot,
    store::StationStore,
};

#[derive(Parser)]
#[command(name = "avwx-recorder", about = "Aviation weather bulletin recorder")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the bulletin caches and rebuild the snapshot and query documents
    Batch {
        /// Download fresh cache files before scanning
        #[arg(short = 'w', long)]
        fetch: bool,
    },
    /// Follow the streaming update feed, checkpointing on an interval
    Ingest,
    /// Print the stations or pireps inside a bounding box as JSON
    Query {
        kind: QueryKind,
        /// minLng,minLat,maxLng,maxLat
        bounds: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QueryKind {
    Airports,
    Pireps,
}

#[tokio::main]
async fn main() -> Result<(), AvwxError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration, preferring environment variables and config files
    let config = AppConfig::load()?;

    match cli.command {
        Command::Batch { fetch } => batch::run(&config, fetch).await,
        Command::Ingest => run_ingest(&config).await,
        Command::Query { kind, bounds } => run_query(&config, kind, &bounds),
    }
}

/// Long-lived ingest mode: one task consumes the feed, the checkpoint timer
/// runs inside the ingestor, ctrl-c cancels both.
async fn run_ingest(config: &AppConfig) -> Result<(), AvwxError> {
    config.snapshot.validate()?;

    let store = Arc::new(StationStore::new());

    // a missing snapshot is the expected first-run state
    let existing: BTreeMap<String, StationReport> = snapshot::load_or_default(&config.snapshot.path);
    if !existing.is_empty() {
        info!("Restored {} station reports from snapshot", existing.len());
    }
    store.replace(existing).await;

    let pireps: Vec<Pirep> = snapshot::load_or_default(&config.snapshot.pireps_path);
    if !pireps.is_empty() {
        info!("Restored {} pireps from snapshot", pireps.len());
    }
    store.replace_pireps(pireps).await;

    let feed = FeedClientBuilder::new(&config.feed.addr).connect().await?;
    let ingestor = StreamIngestor::new(Arc::clone(&store), &config.snapshot);

    let shutdown_signal = signal::ctrl_c();

    tokio::select! {
        result = ingestor.run(feed) => {
            info!("Ingest completed: {:?}", result);
            result
        }
        _ = shutdown_signal => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}

/// Answer one bounding-box query from the persisted documents.
///
/// Malformed bounds yield an empty result, not an error response.
fn run_query(config: &AppConfig, kind: QueryKind, bounds: &str) -> Result<(), AvwxError> {
    let bounds = match BoundingBox::parse(bounds) {
        Some(bounds) => bounds,
        None => {
            println!("[]");
            return Ok(());
        }
    };

    let output = match kind {
        QueryKind::Airports => {
            let records: Vec<query::StationRecord> =
                snapshot::load_or_default(&config.snapshot.records_path);
            serde_json::to_string(&query::filter_stations(&records, &bounds))?
        }
        QueryKind::Pireps => {
            let pireps: Vec<Pirep> = snapshot::load_or_default(&config.snapshot.pireps_path);
            serde_json::to_string(&query::filter_pireps(&pireps, &bounds))?
        }
    };
    println!("{output}");
    Ok(())
}
