use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_moved_threshold() -> f64 {
    0.25
}

fn default_enabled() -> bool {
    true
}

/// Per-camera settings as the fleet operator maintains them.
///
/// Explicit config is handed to each camera's processing context when its
/// loop starts; nothing is cached process-wide between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    pub camera_key: String,
    /// Tracked class names, original casing. Signal ids are derived by
    /// lower-casing.
    pub class_names: Vec<String>,
    /// Names the producer that populates class-signal values; used only to
    /// build signal queries.
    pub prediction_source_name: String,
    #[serde(default = "default_moved_threshold")]
    pub object_moved_detection_threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetConfig {
    pub cameras: Vec<CameraConfig>,
}

impl FleetConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read fleet config from {}", path.display()))?;
        serde_json::from_str(&contents).context("failed to parse fleet config")
    }

    pub fn enabled_cameras(&self) -> impl Iterator<Item = &CameraConfig> {
        self.cameras.iter().filter(|camera| camera.enabled)
    }
}
