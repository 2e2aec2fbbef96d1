use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
        }
    }
}

/// A candidate customer visit detected from the person-presence signal.
///
/// Sessions are rebuilt from scratch on every polling tick; the deterministic
/// id is what lets repeated recomputation converge on one stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub camera_key: String,
    pub started: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    pub items: Vec<Item>,
}

impl Session {
    /// Open a new session at `started`. The id derives from the camera key
    /// and the full millisecond start timestamp, so two ticks that observe
    /// the same presence interval produce the same id.
    pub fn open(camera_key: &str, started: DateTime<Utc>) -> Self {
        Self {
            id: format!("{camera_key}-{}", started.timestamp_millis()),
            camera_key: camera_key.to_string(),
            started,
            ended: None,
            items: Vec::new(),
        }
    }

    /// Status is always derived from the end timestamp, never stored as
    /// independent mutable state.
    pub fn status(&self) -> SessionStatus {
        if self.ended.is_none() {
            SessionStatus::InProgress
        } else {
            SessionStatus::Completed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_is_deterministic_in_camera_and_start() {
        let started = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let a = Session::open("cam-1", started);
        let b = Session::open("cam-1", started);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, format!("cam-1-{}", started.timestamp_millis()));

        let other = Session::open("cam-2", started);
        assert_ne!(a.id, other.id);
    }

    #[test]
    fn status_derives_from_end_timestamp() {
        let started = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut session = Session::open("cam-1", started);
        assert_eq!(session.status(), SessionStatus::InProgress);

        session.ended = Some(started + chrono::Duration::seconds(30));
        assert_eq!(session.status(), SessionStatus::Completed);
    }
}
