// ============================================
// FontFlow - settings.rs
// ============================================
// User preferences, stored as fontflow_settings.json next to the EXE.
//
// Example file:
//
//   {
//     "write_registry": true,
//     "broadcast_timeout_ms": 1000,
//     "skip_system_dir": false,
//     "extra_font_dirs": ["D:\\MyFonts"],
//     "last_directory": "C:\\Users\\ada\\Downloads"
//   }
//
// Every field is optional - anything missing takes its default, and a
// missing or broken file just means "all defaults".
// ============================================

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::registrar::DEFAULT_BROADCAST_TIMEOUT_MS;

/// Filename for the settings file (stored next to the EXE)
const SETTINGS_FILE_NAME: &str = "fontflow_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Record installed fonts under the Fonts registry key so they load
    /// again after a reboot
    pub write_registry: bool,

    /// How long the WM_FONTCHANGE broadcast may wait on each window
    pub broadcast_timeout_ms: u32,

    /// Go straight to the per-user folders
    pub skip_system_dir: bool,

    /// Extra per-user folders, tried after the built-in ones
    pub extra_font_dirs: Vec<PathBuf>,

    /// Folder the ZIP picker opened last time
    pub last_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            write_registry: true,
            broadcast_timeout_ms: DEFAULT_BROADCAST_TIMEOUT_MS,
            skip_system_dir: false,
            extra_font_dirs: Vec::new(),
            last_directory: None,
        }
    }
}

impl Settings {
    /// Where the settings file lives
    pub fn default_path() -> PathBuf {
        crate::paths::app_directory().join(SETTINGS_FILE_NAME)
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load_or_default(path: &Path) -> Settings {
        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Settings::default();
        }
        match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file: {:#}", e);
                Settings::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Settings> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Save, but only warn on failure (e.g. EXE on a read-only drive)
    pub fn save_or_warn(&self, path: &Path) {
        if let Err(e) = self.save(path) {
            log::warn!("Could not save settings: {:#}", e);
        }
    }
}

// ============================================
// TESTS
// ============================================
