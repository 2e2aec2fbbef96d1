use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::info;
use tokio_util::sync::CancellationToken;

use shelfwatch::config::FleetConfig;
use shelfwatch::engine::{run_cameras, CameraContext, PollConfig};
use shelfwatch::events::{EventSink, PipelineEvent};
use shelfwatch::metrics::{MetricsSource, ReplayMetricsSource};
use shelfwatch::store::{SessionStore, SqliteSessionStore};

#[derive(Parser, Debug)]
#[command(
    name = "shelfwatchd",
    about = "Session and item-event detector for a camera fleet"
)]
struct Args {
    /// Fleet configuration file (JSON).
    #[arg(long, env = "SHELFWATCH_CONFIG")]
    config: PathBuf,

    /// Replay metrics fixture file (JSON).
    #[arg(long, env = "SHELFWATCH_METRICS")]
    metrics: PathBuf,

    /// SQLite database path for the session store.
    #[arg(long, env = "SHELFWATCH_DB", default_value = "shelfwatch.db")]
    db: PathBuf,

    /// Override ticks per invocation (0 = poll until interrupted).
    #[arg(long)]
    ticks: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let fleet = FleetConfig::load(&args.config)?;
    let metrics: Arc<dyn MetricsSource> = Arc::new(ReplayMetricsSource::from_file(&args.metrics)?);
    let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::new(args.db)?);

    let mut poll = PollConfig::default();
    if let Some(ticks) = args.ticks {
        poll.ticks = if ticks == 0 { None } else { Some(ticks) };
    }

    let (events, mut event_rx) = EventSink::channel();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                PipelineEvent::MetricsLoaded {
                    camera_key,
                    series_count,
                } => info!("{series_count} metric series loaded. Camera: {camera_key}"),
                PipelineEvent::ObservationsBuilt {
                    camera_key,
                    sample_count,
                    earliest,
                    latest,
                } => info!(
                    "Metrics transformed, observations: {sample_count}, earliest: {earliest}, latest: {latest}. Camera: {camera_key}"
                ),
                PipelineEvent::SessionsDiscovered {
                    camera_key,
                    session_count,
                } => info!("{session_count} sessions discovered. Camera: {camera_key}"),
            }
        }
    });

    let cancel_token = CancellationToken::new();
    {
        let token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping camera loops");
                token.cancel();
            }
        });
    }

    let contexts: Vec<CameraContext> = fleet
        .enabled_cameras()
        .cloned()
        .map(|camera| {
            CameraContext::new(camera, Arc::clone(&metrics), Arc::clone(&store))
                .with_poll(poll.clone())
                .with_events(events.clone())
        })
        .collect();

    run_cameras(contexts, cancel_token).await
}
