use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{MetricSeries, MetricsQuery};
use super::MetricsSource;

/// File-backed metrics source for local runs and integration tests.
///
/// Fixtures map signal ids to raw (timestamp, value) points. A fetch buckets
/// the points inside the query range by the query period with max
/// aggregation, then returns timestamps newest-first the way the cloud
/// backend does. Buckets align to absolute time (epoch multiples of the
/// period), so a point is reported at the same timestamp no matter where the
/// query range begins.
pub struct ReplayMetricsSource {
    signals: HashMap<String, Vec<(DateTime<Utc>, f64)>>,
}

#[derive(Debug, Deserialize)]
struct ReplayPoint {
    timestamp: DateTime<Utc>,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ReplayFile {
    signals: HashMap<String, Vec<ReplayPoint>>,
}

impl ReplayMetricsSource {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay metrics from {}", path.display()))?;
        let file: ReplayFile =
            serde_json::from_str(&contents).context("failed to parse replay metrics file")?;

        Ok(Self::from_points(
            file.signals
                .into_iter()
                .map(|(id, points)| {
                    (
                        id,
                        points
                            .into_iter()
                            .map(|point| (point.timestamp, point.value))
                            .collect(),
                    )
                })
                .collect(),
        ))
    }

    pub fn from_points(signals: HashMap<String, Vec<(DateTime<Utc>, f64)>>) -> Self {
        let mut signals = signals;
        for points in signals.values_mut() {
            points.sort_by_key(|(timestamp, _)| *timestamp);
        }
        Self { signals }
    }
}

#[async_trait]
impl MetricsSource for ReplayMetricsSource {
    async fn fetch(&self, query: &MetricsQuery) -> Result<HashMap<String, MetricSeries>> {
        let period_secs = query.period.as_secs() as i64;
        if period_secs == 0 {
            bail!("query period must be at least one second");
        }

        let mut out = HashMap::with_capacity(query.signals.len());
        for spec in &query.signals {
            let points = self.signals.get(&spec.id).map(Vec::as_slice).unwrap_or(&[]);

            // Max value per period bucket. Buckets are keyed by absolute
            // epoch multiples of the period, not by offset from the query
            // start, so consecutive queries with shifted ranges report the
            // same point at the same timestamp.
            let mut buckets: BTreeMap<i64, f64> = BTreeMap::new();
            for (timestamp, value) in points {
                if *timestamp < query.from || *timestamp > query.to {
                    continue;
                }
                let bucket = timestamp.timestamp().div_euclid(period_secs);
                buckets
                    .entry(bucket)
                    .and_modify(|max| *max = max.max(*value))
                    .or_insert(*value);
            }

            let mut timestamps = Vec::with_capacity(buckets.len());
            let mut values = Vec::with_capacity(buckets.len());
            for (bucket, value) in buckets.iter().rev() {
                let start = DateTime::from_timestamp(bucket * period_secs, 0)
                    .context("bucket start outside representable time range")?;
                timestamps.push(start);
                values.push(*value);
            }

            out.insert(
                spec.id.clone(),
                MetricSeries {
                    id: spec.id.clone(),
                    timestamps,
                    values,
                },
            );
        }

        Ok(out)
    }
}
