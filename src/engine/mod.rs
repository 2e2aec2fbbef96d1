pub mod controller;
pub mod loop_worker;

pub use controller::{run_cameras, PollingController};
pub use loop_worker::{polling_loop, run_tick};

use std::sync::Arc;
use std::time::Duration;

use crate::config::CameraConfig;
use crate::detect::DetectionConfig;
use crate::events::EventSink;
use crate::metrics::MetricsSource;
use crate::store::SessionStore;

/// Cadence and store policy for one polling invocation.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time range of metrics fetched on every tick.
    pub lookback: Duration,
    /// Tick period, also the metric sample period requested.
    pub period: Duration,
    /// Ticks per invocation; `None` polls until cancelled.
    pub ticks: Option<u32>,
    /// When false, a completed session with no items is deleted from the
    /// store instead of kept.
    pub store_empty_completed_sessions: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(5 * 60),
            period: Duration::from_secs(10),
            ticks: Some(5),
            store_empty_completed_sessions: false,
        }
    }
}

/// Everything one camera's polling loop needs.
///
/// Contexts are camera-scoped and never shared, so cameras can run
/// concurrently without any synchronization between them.
#[derive(Clone)]
pub struct CameraContext {
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub poll: PollConfig,
    pub metrics: Arc<dyn MetricsSource>,
    pub store: Arc<dyn SessionStore>,
    pub events: EventSink,
}

impl CameraContext {
    pub fn new(
        camera: CameraConfig,
        metrics: Arc<dyn MetricsSource>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let detection = DetectionConfig {
            moved_fraction: camera.object_moved_detection_threshold,
            ..DetectionConfig::default()
        };

        Self {
            camera,
            detection,
            poll: PollConfig::default(),
            metrics,
            store,
            events: EventSink::disabled(),
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }
}
