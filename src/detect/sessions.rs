use chrono::{DateTime, Utc};

use crate::models::Session;
use crate::observation::ObservationWindow;

/// Scanner state for the presence state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresenceState {
    /// No below-threshold sample seen yet. Nothing is processed until one
    /// is: a visit already in progress at window start would otherwise be
    /// misread as a fresh session.
    AwaitingBaseline,
    Absent,
    Present,
}

/// Scan the person window in ascending time order and produce one session
/// per presence interval, in time order, all with empty item lists.
///
/// A session that is still open when the samples run out is left with no end
/// timestamp; the next tick rebuilds it from scratch once more samples exist.
/// There is no hysteresis: a single noisy sample can open or close a session.
pub fn discover_sessions(
    window: &ObservationWindow,
    camera_key: &str,
    presence_threshold: f64,
) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    let mut state = PresenceState::AwaitingBaseline;
    let mut previous_timestamp: Option<DateTime<Utc>> = None;

    for sample in window.samples() {
        match state {
            PresenceState::AwaitingBaseline => {
                if sample.value < presence_threshold {
                    state = PresenceState::Absent;
                }
            }
            PresenceState::Absent => {
                if sample.value > presence_threshold {
                    sessions.push(Session::open(camera_key, sample.timestamp));
                    state = PresenceState::Present;
                }
            }
            PresenceState::Present => {
                if sample.value <= presence_threshold {
                    // The visit ended at the last timestamp presence was
                    // still confirmed, not at the absence sample itself.
                    if let Some(session) = sessions.last_mut() {
                        session.ended = previous_timestamp;
                    }
                    state = PresenceState::Absent;
                }
            }
        }
        previous_timestamp = Some(sample.timestamp);
    }

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricSeries;
    use crate::models::SessionStatus;
    use chrono::TimeZone;

    const THRESHOLD: f64 = 20.0;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn window(points: &[(i64, f64)]) -> ObservationWindow {
        let series = MetricSeries {
            id: "person".to_string(),
            timestamps: points.iter().map(|(t, _)| ts(*t)).collect(),
            values: points.iter().map(|(_, v)| *v).collect(),
        };
        ObservationWindow::from_series(&series).unwrap()
    }

    #[test]
    fn single_completed_session_boundaries() {
        let sessions = discover_sessions(
            &window(&[(0, 10.0), (10, 30.0), (20, 30.0), (30, 10.0)]),
            "cam-1",
            THRESHOLD,
        );

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].started, ts(10));
        assert_eq!(sessions[0].ended, Some(ts(20)));
        assert_eq!(sessions[0].status(), SessionStatus::Completed);
        assert!(sessions[0].items.is_empty());
    }

    #[test]
    fn no_session_before_absence_baseline() {
        // Presence from the very first sample: a visit already in progress
        // at window start must not open a session.
        let sessions = discover_sessions(
            &window(&[(0, 30.0), (10, 30.0), (20, 10.0)]),
            "cam-1",
            THRESHOLD,
        );
        assert!(sessions.is_empty());

        // After the baseline drop, a later rise does open one.
        let sessions = discover_sessions(
            &window(&[(0, 30.0), (10, 10.0), (20, 30.0), (30, 10.0)]),
            "cam-1",
            THRESHOLD,
        );
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].started, ts(20));
        assert_eq!(sessions[0].ended, Some(ts(20)));
    }

    #[test]
    fn open_session_at_stream_end() {
        let sessions = discover_sessions(&window(&[(0, 10.0), (10, 30.0)]), "cam-1", THRESHOLD);

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].started, ts(10));
        assert_eq!(sessions[0].ended, None);
        assert_eq!(sessions[0].status(), SessionStatus::InProgress);
    }

    #[test]
    fn threshold_equality_counts_absent() {
        // A sample exactly at the threshold neither opens a session nor
        // counts as continued presence.
        let sessions = discover_sessions(
            &window(&[(0, 10.0), (10, 20.0), (20, 10.0)]),
            "cam-1",
            THRESHOLD,
        );
        assert!(sessions.is_empty());

        let sessions = discover_sessions(
            &window(&[(0, 10.0), (10, 30.0), (20, 20.0), (30, 30.0), (40, 10.0)]),
            "cam-1",
            THRESHOLD,
        );
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].started, ts(10));
        assert_eq!(sessions[0].ended, Some(ts(10)));
        assert_eq!(sessions[1].started, ts(30));
        assert_eq!(sessions[1].ended, Some(ts(30)));
    }

    #[test]
    fn multiple_sessions_in_time_order() {
        let sessions = discover_sessions(
            &window(&[
                (0, 5.0),
                (10, 40.0),
                (20, 45.0),
                (30, 5.0),
                (40, 5.0),
                (50, 60.0),
                (60, 5.0),
            ]),
            "cam-1",
            THRESHOLD,
        );

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].started, ts(10));
        assert_eq!(sessions[0].ended, Some(ts(20)));
        assert_eq!(sessions[1].started, ts(50));
        assert_eq!(sessions[1].ended, Some(ts(50)));
    }

    #[test]
    fn empty_window_yields_no_sessions() {
        assert!(discover_sessions(&window(&[]), "cam-1", THRESHOLD).is_empty());
    }
}
