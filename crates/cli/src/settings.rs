use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use faceenroll_core::detection::infrastructure::onnx_face_detector::DEFAULT_CONFIDENCE;
use faceenroll_core::shared::constants::{
    CAMERA_HEIGHT, CAMERA_WIDTH, DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS, SNAPSHOT_WIDTH,
};

/// Persisted defaults for every run. Missing fields fall back individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint: String,
    pub model_dir: Option<PathBuf>,
    pub model_base_url: Option<String>,
    pub camera_width: u32,
    pub camera_height: u32,
    pub camera_device: u32,
    pub snapshot_width: u32,
    pub confidence: f64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model_dir: None,
            model_base_url: None,
            camera_width: CAMERA_WIDTH,
            camera_height: CAMERA_HEIGHT,
            camera_device: 0,
            snapshot_width: SNAPSHOT_WIDTH,
            confidence: DEFAULT_CONFIDENCE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceEnroll").join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Reads settings from `path`; a missing or unparsable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| match serde_json::from_str(&json) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring unreadable settings at {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = Self::config_path().ok_or("could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
