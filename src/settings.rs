//! Persistent settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::convert::ConvertOptions;
use crate::util::Result;

const MAX_RECENT_FILES: usize = 10;

/// Settings that persist between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Last converted input
    pub last_input: Option<PathBuf>,

    // Recent inputs (most recent first, max 10)
    pub recent_inputs: Vec<PathBuf>,

    // Copy the input aside before converting
    pub backup: bool,

    pub convert: ConvertOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_input: None,
            recent_inputs: Vec::new(),
            backup: true,
            convert: ConvertOptions::default(),
        }
    }
}

impl Settings {
    /// Default settings file path.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("ply2colmap");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> Self {
        Self::path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load settings from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to the default location.
    pub fn save(&self) -> Result<()> {
        match Self::path() {
            Some(path) => self.save_to(&path),
            None => Ok(()),
        }
    }

    /// Save settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Record a converted input (moves to top if already present).
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_inputs.retain(|p| p != &path);
        self.recent_inputs.insert(0, path.clone());
        self.recent_inputs.truncate(MAX_RECENT_FILES);
        self.last_input = Some(path);
    }

    /// Recent inputs that still exist.
    pub fn recent_inputs(&self) -> Vec<&PathBuf> {
        self.recent_inputs.iter().filter(|p| p.exists()).collect()
    }
}
