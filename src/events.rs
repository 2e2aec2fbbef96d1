use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Pipeline stage notifications an embedder may subscribe to.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    MetricsLoaded {
        camera_key: String,
        series_count: usize,
    },
    ObservationsBuilt {
        camera_key: String,
        sample_count: usize,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
    SessionsDiscovered {
        camera_key: String,
        session_count: usize,
    },
}

/// Fire-and-forget event emission. Sending never blocks the pipeline, and a
/// dropped receiver just means nobody is listening.
#[derive(Clone)]
pub struct EventSink {
    tx: Option<UnboundedSender<PipelineEvent>>,
}

impl EventSink {
    /// Sink that drops every event.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(PipelineEvent::MetricsLoaded {
            camera_key: "cam-1".to_string(),
            series_count: 3,
        });
        sink.emit(PipelineEvent::SessionsDiscovered {
            camera_key: "cam-1".to_string(),
            session_count: 1,
        });

        assert!(matches!(
            rx.recv().await,
            Some(PipelineEvent::MetricsLoaded { series_count: 3, .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(PipelineEvent::SessionsDiscovered { session_count: 1, .. })
        ));
    }

    #[test]
    fn disabled_sink_and_dropped_receiver_are_silent() {
        let sink = EventSink::disabled();
        sink.emit(PipelineEvent::MetricsLoaded {
            camera_key: "cam-1".to_string(),
            series_count: 0,
        });

        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.emit(PipelineEvent::MetricsLoaded {
            camera_key: "cam-1".to_string(),
            series_count: 0,
        });
    }
}
