//! Settings store
//!
//! The agent's configuration source: a small key-value record holding the
//! server URL, API token and transfer password. The agent re-reads it at the
//! start of every poll cycle, so edits made by the settings tool take effect
//! without a restart.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use crate::domain::credentials::Credentials;

/// Environment variable overriding the settings file location
pub const SETTINGS_PATH_ENV: &str = "EASYTRANSFER_SETTINGS";

/// Default settings file location
///
/// `<config dir>/easytransfer/settings.json` (`~/.config` on Linux), or
/// `./easytransfer-settings.json` when the platform has no config directory.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("easytransfer").join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("easytransfer-settings.json"))
}

/// Persisted settings record
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// When the record was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Settings {
    pub fn new(server_url: String, api_token: String, password: String) -> Self {
        Self {
            server_url: Some(server_url),
            api_token: Some(api_token),
            password: Some(password),
            updated_at: None,
        }
    }

    /// Returns credentials if all three values are present and non-empty
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(
            self.server_url.as_deref(),
            self.api_token.as_deref(),
            self.password.as_deref(),
        )
    }

    /// Lists the keys that keep these settings from being usable
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());

        let mut missing = Vec::new();
        if blank(&self.server_url) {
            missing.push("server_url");
        }
        if blank(&self.api_token) {
            missing.push("api_token");
        }
        if blank(&self.password) {
            missing.push("password");
        }
        missing
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");

        f.debug_struct("Settings")
            .field("server_url", &self.server_url)
            .field("api_token", &redacted(&self.api_token))
            .field("password", &redacted(&self.password))
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Storage backend for settings
///
/// The agent only ever calls `load`; writes come from the settings tool.
pub trait SettingsStore: Send + Sync {
    /// Loads the current settings; a store with nothing saved yields empty settings
    fn load(&self) -> Result<Settings>;

    /// Replaces the stored settings
    fn save(&self, settings: &Settings) -> Result<()>;

    /// Removes all stored settings
    fn clear(&self) -> Result<()>;
}

/// JSON file implementation of SettingsStore
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read settings from {}", self.path.display()));
            }
        };

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let mut record = settings.clone();
        record.updated_at = Some(Utc::now());

        let json = serde_json::to_string_pretty(&record).context("Failed to encode settings")?;

        // Owner-only temp file in the same directory, renamed over the target
        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        file.write_all(json.as_bytes())
            .context("Failed to write settings")?;
        file.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove {}", self.path.display()))
            }
        }
    }
}

/// In-memory implementation of SettingsStore
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings> {
        let settings = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        Ok(settings.clone())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let mut current = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("settings lock poisoned"))?;
        *current = settings.clone();
        current.updated_at = Some(Utc::now());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.save(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings::new(
            "http://localhost:5000".to_string(),
            "token".to_string(),
            "1234".to_string(),
        )
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        let settings = store.load().unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested").join("settings.json"));

        store.save(&sample()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.server_url.as_deref(), Some("http://localhost:5000"));
        assert!(loaded.updated_at.is_some());

        let creds = loaded.credentials().unwrap();
        assert_eq!(creds.token(), "token");
        assert_eq!(creds.password(), "1234");
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::new(&path);

        store.save(&sample()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_concurrent_saves_leave_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = FileSettingsStore::new(&path);
                std::thread::spawn(move || {
                    let mut settings = sample();
                    settings.api_token = Some(format!("token-{}", i));
                    store.save(&settings).unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let loaded = FileSettingsStore::new(&path).load().unwrap();
        assert!(loaded.api_token.unwrap().starts_with("token-"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_default_path_ends_in_app_dir() {
        let path = default_settings_path();
        assert!(
            path.ends_with("easytransfer/settings.json")
                || path.ends_with("easytransfer-settings.json")
        );
    }

    #[test]
    fn test_file_uses_plain_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server_url":"http://s","api_token":"t","password":"p"}"#,
        )
        .unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(store.load().unwrap().credentials().is_some());
    }

    #[test]
    fn test_clear_removes_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        store.save(&sample()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.load().unwrap().credentials().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileSettingsStore::new(&path).load().is_err());
    }

    #[test]
    fn test_missing_keys() {
        let mut settings = sample();
        assert!(settings.missing_keys().is_empty());

        settings.api_token = Some(String::new());
        settings.password = None;
        assert_eq!(settings.missing_keys(), vec!["api_token", "password"]);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("1234"));
        assert!(!debug.contains("\"token\""));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySettingsStore::default();
        assert!(store.load().unwrap().credentials().is_none());

        store.save(&sample()).unwrap();
        assert!(store.load().unwrap().credentials().is_some());

        store.clear().unwrap();
        assert!(store.load().unwrap().credentials().is_none());
    }
}
