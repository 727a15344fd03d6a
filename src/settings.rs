//! User settings and the local key/value storage they live in.
//!
//! Settings are kept the way a browser page keeps them in `localStorage`: one
//! JSON string under the `SETTING` key of a small persistent string map.

use log::warn;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage key holding the serialized [`Settings`].
pub const SETTINGS_KEY: &str = "SETTING";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub save_path: String,
    pub api_key: String,
}

impl Settings {
    pub fn new(save_path: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            save_path: save_path.into(),
            api_key: api_key.into(),
        }
    }

    /// Both fields are required before a cutout can run.
    pub fn is_complete(&self) -> bool {
        !self.save_path.is_empty() && !self.api_key.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read storage file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write storage file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed storage data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Persistent string map, the shape of browser local storage.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Load/save access to [`Settings`]; injected into the view so tests can fake it.
pub trait SettingsStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Settings>, StorageError>;
    fn save(&self, settings: &Settings) -> Result<(), StorageError>;
}

/// A JSON object file on disk, rewritten on every `set_item`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(map)?).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking every future save
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Malformed(err)) => {
                warn!("Replacing malformed storage file {:?}: {}", self.path, err);
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

/// In-process storage, used by tests and as a fallback when no config dir exists.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<K> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

impl<S: SettingsStore + ?Sized> SettingsStore for Box<S> {
    fn load(&self) -> Result<Option<Settings>, StorageError> {
        (**self).load()
    }

    fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        (**self).save(settings)
    }
}

/// [`SettingsStore`] keeping the settings as JSON under [`SETTINGS_KEY`].
#[derive(Debug)]
pub struct KeyedSettings<K> {
    storage: K,
}

impl<K: KeyValueStore> KeyedSettings<K> {
    pub fn new(storage: K) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }
}

impl<K: KeyValueStore> SettingsStore for KeyedSettings<K> {
    fn load(&self) -> Result<Option<Settings>, StorageError> {
        match self.storage.get_item(SETTINGS_KEY)? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), StorageError> {
        self.storage
            .set_item(SETTINGS_KEY, &serde_json::to_string(settings)?)
    }
}
