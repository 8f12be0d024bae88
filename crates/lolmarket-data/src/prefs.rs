//! Persisted UI preferences.

use lolmarket_core::error::PrefsError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Key under which the last selected market id is stored.
pub const LAST_SELECTED_MARKET: &str = "last_selected_market_id";

/// String key/value preferences kept in a TOML file.
#[derive(Debug)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
}

impl PreferenceStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| PrefsError::Parse(e.to_string()))?
        } else {
            debug!(path = %path.display(), "no preference file yet");
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path),
            values: Mutex::new(values),
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    /// Set `key` and write the file.
    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), PrefsError> {
        let mut values = self.values();
        values.insert(key.to_string(), value.into());
        self.save(&values)
    }

    /// Remove `key` and write the file.
    pub fn remove(&self, key: &str) -> Result<Option<String>, PrefsError> {
        let mut values = self.values();
        let previous = values.remove(key);
        self.save(&values)?;
        Ok(previous)
    }

    /// Last market the user selected.
    pub fn last_selected_market(&self) -> Option<i64> {
        let raw = self.get(LAST_SELECTED_MARKET)?;
        match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(value = %raw, "ignoring malformed {}", LAST_SELECTED_MARKET);
                None
            }
        }
    }

    pub fn set_last_selected_market(&self, market_id: i64) -> Result<(), PrefsError> {
        self.set(LAST_SELECTED_MARKET, market_id.to_string())
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), PrefsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content =
            toml::to_string(values).map_err(|e| PrefsError::Serialization(e.to_string()))?;
        fs::write(path, content)?;
        debug!(path = %path.display(), "preferences saved");
        Ok(())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::open(dir.path().join("prefs.toml")).unwrap();
        assert_eq!(store.get(LAST_SELECTED_MARKET), None);
        assert_eq!(store.last_selected_market(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.toml");

        let store = PreferenceStore::open(&path).unwrap();
        store.set_last_selected_market(42).unwrap();
        store.set("theme", "dark").unwrap();

        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.last_selected_market(), Some(42));
        assert_eq!(reopened.get("theme").as_deref(), Some("dark"));

        assert_eq!(reopened.remove("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(PreferenceStore::open(&path).unwrap().get("theme"), None);
    }

    #[test]
    fn test_malformed_market_id_is_ignored() {
        let store = PreferenceStore::in_memory();
        store.set(LAST_SELECTED_MARKET, "abc").unwrap();
        assert_eq!(store.last_selected_market(), None);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            PreferenceStore::open(&path),
            Err(PrefsError::Parse(_))
        ));
    }
}
