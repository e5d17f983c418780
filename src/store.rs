//! Injected key-value persistence
//!
//! The session core never talks to a concrete storage API. Callers hand it a
//! `SessionStore`; the CLI uses the JSON-file store under `~/.arthmitra`,
//! tests use the in-memory one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store payload was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal persistence capability for session state
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Single-file JSON store (one object, read-modify-write)
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_map(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_map(&self, map: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.load_map()?;
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.load_map()?;
        if map.remove(key).is_some() {
            self.save_map(&map)?;
        }
        Ok(())
    }
}

/// Default location of the CLI's cached session state
pub fn default_session_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".arthmitra")
        .join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("profile").unwrap(), None);

        store.set("profile", "{}").unwrap();
        assert_eq!(store.get("profile").unwrap().as_deref(), Some("{}"));

        store.remove("profile").unwrap();
        assert_eq!(store.get("profile").unwrap(), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("session.json"));

        store.set("session", r#"{"userId":"u1"}"#).unwrap();
        assert_eq!(
            store.get("session").unwrap().as_deref(),
            Some(r#"{"userId":"u1"}"#)
        );

        // second key does not clobber the first
        store.set("other", "x").unwrap();
        assert!(store.get("session").unwrap().is_some());

        store.remove("session").unwrap();
        assert_eq!(store.get("session").unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_default_session_path_shape() {
        let path = default_session_path();
        assert!(path.to_string_lossy().contains(".arthmitra"));
        assert!(path.to_string_lossy().ends_with("session.json"));
    }
}
