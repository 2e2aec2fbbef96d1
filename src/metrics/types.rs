use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signal id of the person-presence series. Class signal ids are the
/// lower-cased class name.
pub const PERSON_SIGNAL_ID: &str = "person";

/// Producer tag for the person-presence signal.
pub const PERSON_SOURCE: &str = "person-detector";

/// A named signal as returned by the metrics backend: two index-aligned
/// arrays. The backend conventionally orders timestamps newest-first, with
/// `values[i]` belonging to `timestamps[i]` under that same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub id: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

/// One signal requested from the metrics source.
#[derive(Debug, Clone)]
pub struct SignalSpec {
    pub id: String,
    pub label: String,
    /// Names the producer that populates this signal's values.
    pub source: String,
}

impl SignalSpec {
    pub fn person() -> Self {
        Self {
            id: PERSON_SIGNAL_ID.to_string(),
            label: "Person".to_string(),
            source: PERSON_SOURCE.to_string(),
        }
    }

    pub fn for_class(class_name: &str, prediction_source_name: &str) -> Self {
        Self {
            id: class_name.to_lowercase(),
            label: class_name.to_string(),
            source: prediction_source_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Max,
}

/// One camera's per-tick metrics request over the lookback window.
#[derive(Debug, Clone)]
pub struct MetricsQuery {
    pub camera_key: String,
    pub signals: Vec<SignalSpec>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub period: Duration,
    pub aggregation: Aggregation,
}
