use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::KeyValueStore;

/// Storage file name in cache directory
const STORAGE_FILE: &str = "session.json";

/// Key-value store backed by a single JSON object on disk.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(STORAGE_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove storage file")?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write storage file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace storage file")?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable storage file");
            BTreeMap::new()
        });
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)?;
        debug!(path = %self.path.display(), keys = entries.len(), "Storage entries written");
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        // An unreadable file has nothing worth keeping; clearing must still succeed.
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable storage file");
            BTreeMap::new()
        });
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)?;
        debug!(path = %self.path.display(), keys = keys.len(), "Storage entries removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("session").unwrap(), None);
    }

    #[test]
    fn test_set_all_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        store.set_all(&[("auth_token", "abc"), ("session", "{}")]).unwrap();

        assert_eq!(store.get("auth_token").unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get("session").unwrap().as_deref(), Some("{}"));
        assert!(store.path().exists());
    }

    #[test]
    fn test_remove_all_deletes_file_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set_all(&[("auth_token", "abc"), ("session", "{}")]).unwrap();
        store.remove_all(&["auth_token", "session"]).unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.get("auth_token").unwrap(), None);
    }

    #[test]
    fn test_remove_all_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set_all(&[("auth_token", "abc"), ("theme", "dark")]).unwrap();
        store.remove_all(&["auth_token"]).unwrap();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get("auth_token").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_errors_on_get_but_can_be_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path(), "not json at all").unwrap();

        assert!(store.get("session").is_err());
        store.remove_all(&["session", "auth_token"]).unwrap();
        assert!(!store.path().exists());
    }
}
