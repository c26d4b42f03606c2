// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key/value storage backends.
//!
//! [`FileStorage`] keeps one file per key under a state directory and is what
//! the CLI uses; [`MemoryStorage`] backs tests and embedders that persist
//! state elsewhere.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use datalens_core::{DatalensError, KeyValueStorage};
use tracing::debug;

/// One file per key under `root`. Writes go through a uniquely named temp
/// file and a rename, so readers only ever see a whole value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, DatalensError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(DatalensError::invalid(format!(
                "storage key `{key}` may only contain letters, digits, `_` and `-`"
            )));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn storage_err(e: std::io::Error) -> DatalensError {
    DatalensError::Storage {
        source: Box::new(e),
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DatalensError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatalensError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root).map_err(storage_err)?;

        // One temp file per writer.
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(storage_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(storage_err)?;
        }
        tmp.write_all(value.as_bytes()).map_err(storage_err)?;
        tmp.as_file().sync_all().map_err(storage_err)?;
        tmp.persist(&path).map_err(|e| storage_err(e.error))?;
        debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatalensError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(e)),
        }
    }
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock cannot leave a half-applied map.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, DatalensError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DatalensError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatalensError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));

        assert_eq!(storage.get("auth_tokens").unwrap(), None);
        storage.set("auth_tokens", "{\"a\":1}").unwrap();
        assert_eq!(storage.get("auth_tokens").unwrap().as_deref(), Some("{\"a\":1}"));

        storage.set("auth_tokens", "{\"a\":2}").unwrap();
        assert_eq!(storage.get("auth_tokens").unwrap().as_deref(), Some("{\"a\":2}"));

        storage.remove("auth_tokens").unwrap();
        storage.remove("auth_tokens").unwrap();
        assert_eq!(storage.get("auth_tokens").unwrap(), None);
    }

    #[test]
    fn file_storage_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("k", "v").unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }

    #[test]
    fn concurrent_writers_each_land_a_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(FileStorage::new(dir.path()));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let storage = std::sync::Arc::clone(&storage);
                std::thread::spawn(move || {
                    let value = format!("{{\"writer\":{i},\"pad\":\"{}\"}}", "x".repeat(4096));
                    for _ in 0..20 {
                        storage.set("auth_tokens", &value).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let stored = storage.get("auth_tokens").unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(parsed["pad"].as_str().unwrap().len(), 4096);

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["auth_tokens.json".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set("auth_tokens", "secret").unwrap();
        let mode = std::fs::metadata(dir.path().join("auth_tokens.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("").is_err());
    }

    #[test]
    fn memory_storage_remove_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
