//! Configuration module
//!
//! Handles CLI configuration: where the shared settings file lives.

use easytransfer_core::settings::{FileSettingsStore, default_settings_path};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings file shared with the runner
    pub settings_path: PathBuf,
}

impl Config {
    /// Uses `settings_path` if given, the default location otherwise
    pub fn new(settings_path: Option<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.unwrap_or_else(default_settings_path),
        }
    }

    pub fn store(&self) -> FileSettingsStore {
        FileSettingsStore::new(self.settings_path.clone())
    }
}
