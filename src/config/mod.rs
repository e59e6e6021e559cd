//! Configuration module for WatchVis
//!
//! This module handles application configuration:
//! - [`AppConfig`] - runtime tunables (list period, trace scaling),
//!   optionally overridden by a `config.toml` in the app data directory
//! - [`AppState`] - persisted UI preferences (`app_state.json`)
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/watchvis-rs/`
//! - **macOS**: `~/Library/Application Support/watchvis-rs/`
//! - **Windows**: `%APPDATA%\watchvis-rs\`

use crate::error::{Result, WatchVisError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "watchvis-rs";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Config override filename
pub const CONFIG_FILE: &str = "config.toml";

/// Default period between watcher-list requests, in milliseconds
pub const DEFAULT_LIST_PERIOD_MS: u64 = 1234;

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        WatchVisError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            WatchVisError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Period between watcher-list requests, in milliseconds
    pub list_period_ms: u64,
    /// Vertical scale applied to trace samples
    pub trace_scale: f64,
    /// Vertical offset applied to trace samples
    pub trace_offset: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            list_period_ms: DEFAULT_LIST_PERIOD_MS,
            trace_scale: 1.0,
            trace_offset: 0.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| WatchVisError::Config(format!("Failed to parse {:?}: {}", path, e)))
    }

    /// Load the config override from the app data directory, or defaults
    /// when absent or unreadable
    pub fn load_or_default() -> Self {
        let Some(path) = app_data_dir().map(|d| d.join(CONFIG_FILE)) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config override: {}", e);
                Self::default()
            }
        }
    }
}

/// UI preferences that persist across sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    /// Dark mode enabled
    pub dark_mode: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

/// Persistent application state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default)]
    pub version: u32,

    /// UI preferences
    #[serde(default)]
    pub ui_preferences: UiPreferences,
}

impl AppState {
    /// Load app state from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(WatchVisError::from)
    }

    /// Save app state to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Load app state from the default location, or defaults when
    /// absent or unreadable
    pub fn load_or_default() -> Self {
        let Some(path) = app_data_dir().map(|d| d.join(APP_STATE_FILE)) else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Failed to load app state: {}", e);
                Self::default()
            }
        }
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(&dir.join(APP_STATE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.list_period_ms, DEFAULT_LIST_PERIOD_MS);
        assert_eq!(config.trace_scale, 1.0);
        assert_eq!(config.trace_offset, 0.0);
    }

    #[test]
    fn test_app_config_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "list_period_ms = 500\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.list_period_ms, 500);
        // unspecified fields keep their defaults
        assert_eq!(config.trace_scale, 1.0);
    }

    #[test]
    fn test_app_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(APP_STATE_FILE);

        let mut state = AppState::default();
        state.ui_preferences.dark_mode = false;
        state.save_to(&path).unwrap();

        let loaded = AppState::load_from(&path).unwrap();
        assert!(!loaded.ui_preferences.dark_mode);
    }

    #[test]
    fn test_app_state_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(AppState::load_from(&path).is_err());
    }
}
