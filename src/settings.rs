//! User-editable preferences, persisted as a flat JSON document.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Preferences that survive restarts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory downloads are written under (default: ~/Downloads/ChanScraper)
    pub download_path: PathBuf,

    /// Load the last thread automatically on start (default: false)
    pub auto_load: bool,

    /// Nest downloads as `{board}/{thread_id}` under the base directory (default: true)
    pub create_subfolders: bool,

    /// Query the release endpoint on start (default: true)
    pub check_updates_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            auto_load: false,
            create_subfolders: true,
            check_updates_on_start: true,
        }
    }
}

fn default_download_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join("Downloads").join("ChanScraper")
}

/// Reads and writes [`Settings`] at a fixed path
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings. A missing file yields the defaults; unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file exists but cannot be read,
    /// [`Error::Serialization`] if it is not a settings document.
    pub fn load(&self) -> Result<Settings> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let settings = serde_json::from_slice(&raw)?;
        tracing::debug!(path = %self.path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Write settings, creating the parent directory if needed
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(settings)?;
        let mut staging = self.path.as_os_str().to_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)?;
        tracing::info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let settings = Settings::default();

        assert!(settings.download_path.ends_with("Downloads/ChanScraper"));
        assert!(!settings.auto_load);
        assert!(settings.create_subfolders);
        assert!(settings.check_updates_on_start);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("settings.json"));

        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            download_path: PathBuf::from("/data/media"),
            auto_load: true,
            create_subfolders: false,
            check_updates_on_start: false,
        };

        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap(), settings);
        assert!(!temp_dir.path().join("nested").join("settings.json.tmp").exists());
    }

    #[test]
    fn stored_document_is_flat_json() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("settings.json"));
        store.save(&Settings::default()).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert!(object.values().all(|v| !v.is_object() && !v.is_array()));
        assert_eq!(object["create_subfolders"], serde_json::json!(true));
    }

    #[test]
    fn partial_document_fills_in_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"auto_load": true, "theme": "dark"}"#).unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();

        assert!(settings.auto_load);
        assert!(settings.create_subfolders);
    }

    #[test]
    fn malformed_document_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let result = SettingsStore::new(&path).load();

        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
