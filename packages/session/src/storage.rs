//! Key/value storage backends for session fields.
//!
//! [`FileStorage`] persists a flat JSON object of strings to disk and is
//! what the CLI uses; [`MemoryStorage`] keeps everything in memory for
//! tests and throwaway sessions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::SessionError;

/// Default location of the session file.
pub const DEFAULT_SESSION_PATH: &str = "data/session.json";

/// Environment variable overriding [`DEFAULT_SESSION_PATH`].
pub const SESSION_FILE_ENV: &str = "BRITMETRICS_SESSION_FILE";

/// Persistent string storage keyed by name.
pub trait SessionStorage: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Deletes a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.values).is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// The file is re-read on every access so that separate CLI invocations
/// observe each other's writes. A missing file reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Creates storage backed by `path`. The file is created lazily.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Storage at `$BRITMETRICS_SESSION_FILE`, or [`DEFAULT_SESSION_PATH`].
    #[must_use]
    pub fn from_env() -> Self {
        let path = std::env::var(SESSION_FILE_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_PATH.to_string());
        Self::new(path)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = lock(&self.write_lock);
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = lock(&self.write_lock);
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips_values() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set("britmetrics_auth", "tok").unwrap();
        assert_eq!(
            storage.get("britmetrics_auth").unwrap().as_deref(),
            Some("tok")
        );

        storage.remove("britmetrics_auth").unwrap();
        storage.remove("britmetrics_auth").unwrap();
        assert!(storage.get("britmetrics_auth").unwrap().is_none());
    }

    #[test]
    fn file_storage_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested/session.json"));
        assert!(storage.get("britmetrics_email").unwrap().is_none());
        storage.remove("britmetrics_email").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/session.json");

        let first = FileStorage::new(&path);
        first.set("britmetrics_email", "a@b.com").unwrap();
        first.set("britmetrics_trial", "true").unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(
            second.get("britmetrics_email").unwrap().as_deref(),
            Some("a@b.com")
        );

        second.remove("britmetrics_trial").unwrap();
        assert!(first.get("britmetrics_trial").unwrap().is_none());
    }

    #[test]
    fn file_storage_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("britmetrics_auth"),
            Err(SessionError::Json(_))
        ));
    }
}
