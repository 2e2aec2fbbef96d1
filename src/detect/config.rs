/// Tunable thresholds for session and item detection.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Person-presence confidence above which a person counts as present.
    /// Comparison is strict: a sample exactly at the threshold counts absent.
    pub presence_threshold: f64,

    /// Fraction of the before-session confidence a class signal must drop by
    /// across the session boundary for an item event to be recorded.
    pub moved_fraction: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            presence_threshold: 20.0,
            moved_fraction: 0.25,
        }
    }
}
