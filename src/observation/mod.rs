use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::metrics::MetricSeries;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("series '{signal}' has {timestamps} timestamps but {values} values")]
    MalformedSeries {
        signal: String,
        timestamps: usize,
        values: usize,
    },
}

/// One (timestamp, value) pair, carried as an indivisible unit from the point
/// the raw series is received so no reordering can desynchronize the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Ascending-time view over one signal's raw series.
///
/// Rebuilt fresh on every polling tick and never mutated afterwards; nothing
/// is cached across ticks.
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    signal_name: String,
    samples: Vec<Sample>,
}

impl ObservationWindow {
    /// Build a window from a raw series. The metrics backend conventionally
    /// returns timestamps in descending time order, but nothing here relies
    /// on that: pairs are zipped before any ordering happens. A repeated
    /// timestamp collapses to the pair appearing last in source order.
    pub fn from_series(series: &MetricSeries) -> Result<Self, ObservationError> {
        if series.timestamps.len() != series.values.len() {
            return Err(ObservationError::MalformedSeries {
                signal: series.id.clone(),
                timestamps: series.timestamps.len(),
                values: series.values.len(),
            });
        }

        let mut ordered: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        for (timestamp, value) in series.timestamps.iter().zip(series.values.iter()) {
            ordered.insert(*timestamp, *value);
        }

        Ok(Self {
            signal_name: series.id.clone(),
            samples: ordered
                .into_iter()
                .map(|(timestamp, value)| Sample { timestamp, value })
                .collect(),
        })
    }

    pub fn signal_name(&self) -> &str {
        &self.signal_name
    }

    /// Samples in strictly ascending timestamp order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_observation(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|sample| sample.timestamp)
    }

    pub fn last_observation(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|sample| sample.timestamp)
    }

    /// Sample with the greatest timestamp strictly before `instant`, if any.
    pub fn last_before(&self, instant: DateTime<Utc>) -> Option<&Sample> {
        self.samples
            .iter()
            .rev()
            .find(|sample| sample.timestamp < instant)
    }

    /// Sample with the smallest timestamp strictly after `instant`, if any.
    pub fn first_after(&self, instant: DateTime<Utc>) -> Option<&Sample> {
        self.samples.iter().find(|sample| sample.timestamp > instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn series(id: &str, points: &[(i64, f64)]) -> MetricSeries {
        MetricSeries {
            id: id.to_string(),
            timestamps: points.iter().map(|(t, _)| ts(*t)).collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
        }
    }

    #[test]
    fn descending_input_keeps_pairs_aligned() {
        // Backend convention: newest first. Values must follow their
        // timestamps through the reorder.
        let raw = series("person", &[(30, 3.0), (20, 2.0), (10, 1.0)]);
        let window = ObservationWindow::from_series(&raw).unwrap();

        let samples = window.samples();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], Sample { timestamp: ts(10), value: 1.0 });
        assert_eq!(samples[1], Sample { timestamp: ts(20), value: 2.0 });
        assert_eq!(samples[2], Sample { timestamp: ts(30), value: 3.0 });
    }

    #[test]
    fn unordered_input_keeps_pairs_aligned() {
        // A backend that violates its own descending convention must not
        // desynchronize values from timestamps.
        let raw = series("person", &[(20, 2.0), (40, 4.0), (10, 1.0), (30, 3.0)]);
        let window = ObservationWindow::from_series(&raw).unwrap();

        let values: Vec<f64> = window.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(window
            .samples()
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp));
    }

    #[test]
    fn duplicate_timestamp_is_last_write_wins() {
        let raw = series("person", &[(10, 1.0), (20, 2.0), (10, 9.0)]);
        let window = ObservationWindow::from_series(&raw).unwrap();

        assert_eq!(window.len(), 2);
        assert_eq!(window.samples()[0].value, 9.0);
    }

    #[test]
    fn length_mismatch_is_malformed() {
        let raw = MetricSeries {
            id: "person".to_string(),
            timestamps: vec![ts(10), ts(20)],
            values: vec![1.0],
        };
        let err = ObservationWindow::from_series(&raw).unwrap_err();
        assert!(matches!(err, ObservationError::MalformedSeries { .. }));
    }

    #[test]
    fn first_and_last_observation() {
        let raw = series("person", &[(30, 3.0), (10, 1.0), (20, 2.0)]);
        let window = ObservationWindow::from_series(&raw).unwrap();
        assert_eq!(window.first_observation(), Some(ts(10)));
        assert_eq!(window.last_observation(), Some(ts(30)));

        let empty = ObservationWindow::from_series(&series("person", &[])).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.first_observation(), None);
        assert_eq!(empty.last_observation(), None);
    }

    #[test]
    fn neighbour_lookups_are_strict() {
        let raw = series("purell", &[(10, 80.0), (20, 70.0), (30, 50.0)]);
        let window = ObservationWindow::from_series(&raw).unwrap();

        assert_eq!(window.last_before(ts(20)).map(|s| s.value), Some(80.0));
        assert_eq!(window.first_after(ts(20)).map(|s| s.value), Some(50.0));

        // Strict comparisons: a sample exactly at the boundary is excluded.
        assert_eq!(window.last_before(ts(10)), None);
        assert_eq!(window.first_after(ts(30)), None);
    }
}
