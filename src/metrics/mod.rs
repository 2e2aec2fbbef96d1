mod replay;
mod types;

pub use replay::ReplayMetricsSource;
pub use types::{
    Aggregation, MetricSeries, MetricsQuery, SignalSpec, PERSON_SIGNAL_ID, PERSON_SOURCE,
};

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

/// Time-series backend queried once per tick, keyed by signal id.
///
/// Implementations own their retry policy; the engine treats a failed fetch
/// as a skipped tick and carries on.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self, query: &MetricsQuery) -> Result<HashMap<String, MetricSeries>>;
}
