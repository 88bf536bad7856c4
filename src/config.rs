use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::events::{DEFAULT_MAX_EVENTS, DEFAULT_MAX_NOTES_LEN};
use crate::data::merge::{DEFAULT_TOLERANCE_SECS, MAX_TOLERANCE_SECS};

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "DPG_VIEWER_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "dpg-viewer.json";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Tunables read once at startup. Every field has a default, so a partial
/// JSON file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum distal/proximal time gap for pairing, in seconds.
    pub merge_tolerance_secs: f64,
    /// Maximum number of overlaid events.
    pub max_events: usize,
    /// Maximum length of manual-entry notes.
    pub max_notes_len: usize,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            merge_tolerance_secs: DEFAULT_TOLERANCE_SECS,
            max_events: DEFAULT_MAX_EVENTS,
            max_notes_len: DEFAULT_MAX_NOTES_LEN,
            window_width: 1200.0,
            window_height: 800.0,
        }
    }
}

impl Settings {
    /// Settings file location: `$DPG_VIEWER_CONFIG` or `./dpg-viewer.json`.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Read settings from `path`. A missing file gives the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        let settings: Self =
            serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))?;
        Ok(settings.clamped())
    }

    /// Pull the merge tolerance into `0..=MAX_TOLERANCE_SECS`; a non-finite
    /// value falls back to the default.
    pub fn clamped(mut self) -> Self {
        let tolerance = self.merge_tolerance_secs;
        let fixed = if tolerance.is_finite() {
            tolerance.clamp(0.0, MAX_TOLERANCE_SECS)
        } else {
            DEFAULT_TOLERANCE_SECS
        };
        if fixed != tolerance {
            log::warn!("merge_tolerance_secs {tolerance} out of range, using {fixed}");
            self.merge_tolerance_secs = fixed;
        }
        self
    }

    /// Load from the default location; a broken file is logged and ignored.
    pub fn load() -> Self {
        let path = Self::path();
        match Self::from_file(&path) {
            Ok(settings) => {
                log::debug!("settings: {settings:?}");
                settings
            }
            Err(e) => {
                log::warn!("{e:#}; using default settings");
                Self::default()
            }
        }
    }
}
