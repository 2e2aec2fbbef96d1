use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::detect::{discover_items, discover_sessions};
use crate::events::PipelineEvent;
use crate::metrics::{Aggregation, MetricsQuery, SignalSpec, PERSON_SIGNAL_ID};
use crate::models::{Session, SessionStatus};
use crate::observation::ObservationWindow;
use crate::store::SessionStore;

use super::CameraContext;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Per-camera polling loop: fetch → build → detect → store, with one tick
/// fully completing (store included) before the next begins.
///
/// The interval timer holds the tick cadence independent of fetch latency.
/// Cancellation stops the loop between ticks; store operations already
/// spawned by a tick are never aborted.
pub async fn polling_loop(ctx: CameraContext, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(ctx.poll.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut completed_ticks: u32 = 0;

    loop {
        if let Some(limit) = ctx.poll.ticks {
            if completed_ticks >= limit {
                log_info!(
                    "polling finished after {completed_ticks} ticks. Camera: {}",
                    ctx.camera.camera_key
                );
                break;
            }
        }

        tokio::select! {
            _ = ticker.tick() => {
                match run_tick(&ctx, Utc::now()).await {
                    Ok(Some(sessions)) => {
                        log_info!(
                            "tick stored {} sessions. Camera: {}",
                            sessions.len(),
                            ctx.camera.camera_key
                        );
                    }
                    Ok(None) => {
                        log_info!(
                            "tick skipped, insufficient metric data. Camera: {}",
                            ctx.camera.camera_key
                        );
                    }
                    Err(err) => {
                        log_error!(
                            "tick failed for camera {}: {err:?}",
                            ctx.camera.camera_key
                        );
                    }
                }
                completed_ticks += 1;
            }
            _ = cancel_token.cancelled() => {
                log_info!(
                    "polling loop for camera {} shutting down",
                    ctx.camera.camera_key
                );
                break;
            }
        }
    }
}

/// One fetch → build → detect → store pass, recomputed entirely from the
/// current lookback window; no session state is carried between ticks.
///
/// Returns the stored session list, or `None` when the metrics window had
/// too little data to evaluate yet.
pub async fn run_tick(ctx: &CameraContext, now: DateTime<Utc>) -> Result<Option<Vec<Session>>> {
    let lookback =
        chrono::Duration::from_std(ctx.poll.lookback).context("configured lookback out of range")?;

    let query = MetricsQuery {
        camera_key: ctx.camera.camera_key.clone(),
        signals: signal_specs(ctx),
        from: now - lookback,
        to: now,
        period: ctx.poll.period,
        aggregation: Aggregation::Max,
    };

    let mut series_by_id = ctx
        .metrics
        .fetch(&query)
        .await
        .context("metrics fetch failed")?;

    ctx.events.emit(PipelineEvent::MetricsLoaded {
        camera_key: ctx.camera.camera_key.clone(),
        series_count: series_by_id.len(),
    });

    // Without both a person series and at least one class series, each with
    // data, there is nothing to evaluate yet.
    if series_by_id.len() <= 1
        || series_by_id
            .values()
            .any(|series| series.timestamps.is_empty())
    {
        return Ok(None);
    }

    let person_series = series_by_id
        .remove(PERSON_SIGNAL_ID)
        .context("metrics source returned no person series")?;
    let person_window = ObservationWindow::from_series(&person_series)?;

    let class_windows = series_by_id
        .values()
        .map(ObservationWindow::from_series)
        .collect::<Result<Vec<_>, _>>()?;

    if let (Some(earliest), Some(latest)) = (
        person_window.first_observation(),
        person_window.last_observation(),
    ) {
        ctx.events.emit(PipelineEvent::ObservationsBuilt {
            camera_key: ctx.camera.camera_key.clone(),
            sample_count: person_window.len(),
            earliest,
            latest,
        });
    }

    let mut sessions = discover_sessions(
        &person_window,
        &ctx.camera.camera_key,
        ctx.detection.presence_threshold,
    );
    discover_items(
        &mut sessions,
        &ctx.camera.class_names,
        &class_windows,
        ctx.detection.moved_fraction,
    );

    ctx.events.emit(PipelineEvent::SessionsDiscovered {
        camera_key: ctx.camera.camera_key.clone(),
        session_count: sessions.len(),
    });

    store_sessions(
        Arc::clone(&ctx.store),
        &sessions,
        ctx.poll.store_empty_completed_sessions,
    )
    .await;

    Ok(Some(sessions))
}

fn signal_specs(ctx: &CameraContext) -> Vec<SignalSpec> {
    let mut signals = Vec::with_capacity(ctx.camera.class_names.len() + 1);
    signals.push(SignalSpec::person());
    for class_name in &ctx.camera.class_names {
        signals.push(SignalSpec::for_class(
            class_name,
            &ctx.camera.prediction_source_name,
        ));
    }
    signals
}

/// Issue every per-session store operation concurrently and wait for them
/// all. Each operation is keyed by a deterministic id, so ordering between
/// them is irrelevant, and one failure never blocks the rest.
async fn store_sessions(
    store: Arc<dyn SessionStore>,
    sessions: &[Session],
    store_empty_completed: bool,
) {
    let mut tasks = Vec::with_capacity(sessions.len());

    for session in sessions {
        let store = Arc::clone(&store);
        let session = session.clone();
        tasks.push(tokio::spawn(async move {
            let result = match session.status() {
                SessionStatus::Completed
                    if session.items.is_empty() && !store_empty_completed =>
                {
                    // A completed visit with no items is noise; remove any
                    // record a previous tick stored while it was still open.
                    store.delete(&session.id).await
                }
                _ => store.upsert(&session).await,
            };
            (session.id, result)
        }));
    }

    for task in tasks {
        match task.await {
            Ok((_, Ok(()))) => {}
            Ok((session_id, Err(err))) => {
                log_error!("store operation failed for session {session_id}: {err:?}");
            }
            Err(err) => {
                log_error!("store task panicked: {err:?}");
            }
        }
    }
}
