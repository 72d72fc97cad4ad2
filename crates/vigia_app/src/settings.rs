//! Daemon settings, persisted as RON next to the working directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigia_core::{validate_refresh_seconds, DEFAULT_POLL_INTERVAL};
use vigia_engine::{write_atomic, TableRowExtractor, TargetPage};
use vigia_logging::{vigia_error, vigia_info, vigia_warn};

pub const SETTINGS_FILENAME: &str = "vigia.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch; when off the daemon idles until toggled back on.
    pub enabled: bool,
    /// Play the alarm sound with new-document popups.
    pub sound_enabled: bool,
    /// Poll period in seconds, kept exactly as the client sent it.
    pub refresh_seconds: Option<f64>,
    /// Period in minutes, written by old installs. Read once for migration
    /// and cleared on the next save.
    pub refresh_minutes: Option<u64>,
    pub target_url: String,
    pub view_fragment: String,
    pub table_selector: String,
    pub socket_path: PathBuf,
    pub alarm_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_enabled: true,
            refresh_seconds: None,
            refresh_minutes: None,
            target_url: TargetPage::DEFAULT_BASE.to_string(),
            view_fragment: TargetPage::DEFAULT_FRAGMENT.to_string(),
            table_selector: TableRowExtractor::DEFAULT_TABLE_SELECTOR.to_string(),
            socket_path: PathBuf::from("./vigia.sock"),
            alarm_file: None,
        }
    }
}

impl Settings {
    /// Effective poll period. Seconds are authoritative; legacy minutes
    /// apply only while no seconds value has ever been stored. A stored
    /// value outside the accepted range (a hand-edited file, say) falls
    /// back to the default.
    pub fn refresh_interval(&self) -> Duration {
        let stored = match (self.refresh_seconds, self.refresh_minutes) {
            (Some(seconds), _) => Some(seconds),
            (None, Some(minutes)) => Some(minutes as f64 * 60.0),
            (None, None) => None,
        };
        stored
            .and_then(|seconds| validate_refresh_seconds(seconds).ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Store a new poll period exactly as given, fractions included,
    /// completing the minutes-to-seconds migration.
    pub fn set_refresh_seconds(&mut self, seconds: f64) {
        self.refresh_seconds = Some(seconds);
        self.refresh_minutes = None;
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            vigia_info!("No settings at {:?}; using defaults", path);
            return Settings::default();
        }
        Err(err) => {
            vigia_warn!("Failed to read settings from {:?}: {}", path, err);
            return Settings::default();
        }
    };

    match ron::from_str(&content) {
        Ok(settings) => settings,
        Err(err) => {
            vigia_warn!("Failed to parse settings from {:?}: {}", path, err);
            Settings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) {
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(settings, pretty) {
        Ok(text) => text,
        Err(err) => {
            vigia_error!("Failed to serialize settings: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomic(path, &content) {
        vigia_error!("Failed to write settings to {:?}: {}", path, err);
    }
}
