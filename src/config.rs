use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::removebg::DEFAULT_ENDPOINT;
use crate::settings::{KeyedSettings, LocalStorage, MemoryStorage, SettingsStore};

pub const APP_DIR_NAME: &str = "photo-matting";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Application configuration, distinct from the user [`crate::settings::Settings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub api_endpoint: String,
    pub storage_path: Option<PathBuf>,
    /// `None` waits for the matting service indefinitely
    pub request_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            storage_path: None,
            request_timeout_secs: None,
        }
    }
}

/// `<config dir>/photo-matting`, if the platform has a config dir
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

impl AppConfig {
    /// Load `config.json` from the application config dir, or defaults.
    pub fn load() -> Result<Self> {
        match app_config_dir() {
            Some(dir) => Self::load_from(&dir.join(CONFIG_FILE_NAME)),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!("Loaded configuration from: {:?}", path);
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Explicit storage path, else `storage.json` next to the config file.
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        self.storage_path
            .clone()
            .or_else(|| app_config_dir().map(|dir| dir.join(STORAGE_FILE_NAME)))
    }

    /// Settings store backed by the resolved storage file.
    ///
    /// Without any usable location settings live in memory for this run only.
    pub fn settings_store(&self) -> Box<dyn SettingsStore> {
        match self.resolved_storage_path() {
            Some(path) => {
                let storage = LocalStorage::new(path);
                debug!("Settings storage: {:?}", storage.path());
                Box::new(KeyedSettings::new(storage))
            }
            None => {
                warn!("No config directory available, settings will not persist");
                Box::new(KeyedSettings::new(MemoryStorage::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api_endpoint, "https://api.remove.bg/v1.0/removebg");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"requestTimeoutSecs": 90}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(90)));
        assert_eq!(config.api_endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_settings_store_uses_explicit_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage_path: Some(dir.path().join("storage.json")),
            ..Default::default()
        };

        config
            .settings_store()
            .save(&Settings::new("/out", "k1"))
            .unwrap();
        assert!(dir.path().join("storage.json").exists());
        assert_eq!(
            config.settings_store().load().unwrap(),
            Some(Settings::new("/out", "k1"))
        );
    }
}
