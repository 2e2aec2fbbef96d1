use crate::models::{Item, Session, SessionStatus};
use crate::observation::ObservationWindow;

/// Compare each tracked class's confidence across every completed session's
/// boundary and append an item event where it dropped sharply.
///
/// The comparison is boundary-relative: `before` is the last sample strictly
/// before the session started, `after` the first strictly after it ended, and
/// an item is recorded when the drop exceeds `before * moved_fraction`. A
/// class with no sample on either side of a session is skipped for that
/// session — insufficient evidence, not an error. In-progress sessions are
/// never evaluated.
pub fn discover_items(
    sessions: &mut [Session],
    class_names: &[String],
    class_windows: &[ObservationWindow],
    moved_fraction: f64,
) {
    for session in sessions.iter_mut() {
        if session.status() != SessionStatus::Completed {
            continue;
        }
        let Some(ended) = session.ended else {
            continue;
        };

        for class_name in class_names {
            let signal_id = class_name.to_lowercase();
            let Some(window) = class_windows
                .iter()
                .find(|window| window.signal_name() == signal_id)
            else {
                continue;
            };

            let Some(before) = window.last_before(session.started) else {
                continue;
            };
            let Some(after) = window.first_after(ended) else {
                continue;
            };

            let drop = before.value - after.value;
            if drop > before.value * moved_fraction {
                session.items.push(Item::new(class_name.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricSeries;
    use chrono::{DateTime, TimeZone, Utc};

    const MOVED_FRACTION: f64 = 0.25;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn window(id: &str, points: &[(i64, f64)]) -> ObservationWindow {
        let series = MetricSeries {
            id: id.to_string(),
            timestamps: points.iter().map(|(t, _)| ts(*t)).collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
        };
        ObservationWindow::from_series(&series).unwrap()
    }

    fn completed_session(started: i64, ended: i64) -> Session {
        let mut session = Session::open("cam-1", ts(started));
        session.ended = Some(ts(ended));
        session
    }

    #[test]
    fn large_drop_records_item() {
        // before=80, after=50: drop 30 > threshold 20.
        let mut sessions = vec![completed_session(10, 20)];
        discover_items(
            &mut sessions,
            &["Purell".to_string()],
            &[window("purell", &[(0, 80.0), (30, 50.0)])],
            MOVED_FRACTION,
        );

        assert_eq!(sessions[0].items.len(), 1);
        assert_eq!(sessions[0].items[0].class_name, "Purell");
    }

    #[test]
    fn small_drop_records_nothing() {
        // before=80, after=65: drop 15 < threshold 20.
        let mut sessions = vec![completed_session(10, 20)];
        discover_items(
            &mut sessions,
            &["Purell".to_string()],
            &[window("purell", &[(0, 80.0), (30, 65.0)])],
            MOVED_FRACTION,
        );

        assert!(sessions[0].items.is_empty());
    }

    #[test]
    fn missing_evidence_skips_class_only() {
        // "purell" has no sample before the session start, "marker" does and
        // should still be evaluated.
        let mut sessions = vec![completed_session(10, 20)];
        discover_items(
            &mut sessions,
            &["Purell".to_string(), "Marker".to_string()],
            &[
                window("purell", &[(30, 10.0)]),
                window("marker", &[(0, 80.0), (30, 20.0)]),
            ],
            MOVED_FRACTION,
        );

        assert_eq!(sessions[0].items.len(), 1);
        assert_eq!(sessions[0].items[0].class_name, "Marker");
    }

    #[test]
    fn missing_after_sample_skips_class() {
        let mut sessions = vec![completed_session(10, 20)];
        discover_items(
            &mut sessions,
            &["Purell".to_string()],
            &[window("purell", &[(0, 80.0), (15, 60.0)])],
            MOVED_FRACTION,
        );

        assert!(sessions[0].items.is_empty());
    }

    #[test]
    fn in_progress_sessions_are_not_evaluated() {
        let mut sessions = vec![Session::open("cam-1", ts(10))];
        discover_items(
            &mut sessions,
            &["Purell".to_string()],
            &[window("purell", &[(0, 80.0), (30, 10.0)])],
            MOVED_FRACTION,
        );

        assert!(sessions[0].items.is_empty());
    }

    #[test]
    fn absent_class_window_is_skipped() {
        let mut sessions = vec![completed_session(10, 20)];
        discover_items(
            &mut sessions,
            &["Purell".to_string()],
            &[],
            MOVED_FRACTION,
        );

        assert!(sessions[0].items.is_empty());
    }
}
