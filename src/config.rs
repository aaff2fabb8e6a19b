//! Application settings persistence.
//!
//! One JSON file at `<config_dir>/nimshot/settings.json`. Missing or
//! invalid files fall back to defaults; saving creates the directory.
//! The interaction timings (hide debounce, hide settle, handshake
//! bound) live here rather than as hardcoded constants so the glue
//! can tune them per platform.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

/// Saved launcher-widget position, physical pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hotkey: String,
    pub autostart: bool,
    pub widget_position: Option<WidgetPosition>,
    /// `None` = `<data_dir>/nimshot/screenshots`.
    pub screenshot_folder: Option<PathBuf>,
    pub max_storage_mb: u64,
    pub theme: String,
    pub first_launch: bool,

    /// Delay before the popup hides after the pointer leaves.
    pub hide_delay_ms: u64,
    /// Pause after hiding the main window, letting the platform's
    /// hide animation finish before the screen is captured.
    pub settle_delay_ms: u64,
    /// Upper bound on waiting for a new capture window's ready signal.
    pub handshake_timeout_ms: u64,

    /// How many entries the recents popup shows.
    pub recents_limit: usize,
    /// Popup auto-refresh period.
    pub popup_refresh_secs: u64,

    /// Release-manifest URL for the update check.
    pub update_endpoint: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: "Ctrl+Alt+S".to_string(),
            autostart: true,
            widget_position: None,
            screenshot_folder: None,
            max_storage_mb: 1000,
            theme: "dark".to_string(),
            first_launch: true,
            hide_delay_ms: 600,
            settle_delay_ms: 200,
            handshake_timeout_ms: 3000,
            recents_limit: 5,
            popup_refresh_secs: 5,
            update_endpoint: None,
        }
    }
}

impl Settings {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn popup_refresh_period(&self) -> Duration {
        Duration::from_secs(self.popup_refresh_secs)
    }

    /// Load from the default location, falling back to defaults.
    pub fn load() -> Self {
        match default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("[CONFIG] No config directory; using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit path. Returns defaults if the file is
    /// missing or unreadable; logs when the content fails to parse.
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("[CONFIG] Invalid {}: {} — using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), String> {
        let path = default_path().ok_or("Could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write settings: {}", e))?;
        log::info!("[CONFIG] Saved settings to {}", path.display());
        Ok(())
    }
}

/// `<config_dir>/nimshot/settings.json`.
fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("nimshot").join(SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_documented_timings() {
        let s = Settings::default();
        assert_eq!(s.hide_delay(), Duration::from_millis(600));
        assert_eq!(s.settle_delay(), Duration::from_millis(200));
        assert_eq!(s.recents_limit, 5);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load_from(&dir.path().join("nope.json"));
        assert_eq!(s.hotkey, "Ctrl+Alt+S");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut s = Settings::default();
        s.hotkey = "Ctrl+Shift+4".to_string();
        s.hide_delay_ms = 250;
        s.widget_position = Some(WidgetPosition { x: 12.0, y: 34.0 });
        s.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.hotkey, "Ctrl+Shift+4");
        assert_eq!(loaded.hide_delay_ms, 250);
        assert_eq!(loaded.widget_position.unwrap().x, 12.0);
    }

    #[test]
    fn unknown_and_missing_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"hotkey":"F9","future_field":true}"#).unwrap();

        let s = Settings::load_from(&path);
        assert_eq!(s.hotkey, "F9");
        assert_eq!(s.hide_delay_ms, 600);
    }
}
