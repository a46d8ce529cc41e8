use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// String key/value storage backing the login guard.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()>;
    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
    fn keys(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EntriesFile {
    entries: HashMap<String, String>,
}

/// Key/value store written through to a JSON file, so lockouts survive
/// restarts.
pub struct JsonFileStore {
    file_path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A file that cannot be parsed is discarded
    /// and the store starts empty.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<EntriesFile>(&content) {
                Ok(file) => file.entries,
                Err(e) => {
                    tracing::warn!(
                        "Discarding unreadable login guard state {}: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(JsonFileStore {
            file_path: path.to_path_buf(),
            entries,
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        let file = EntriesFile {
            entries: self.entries.clone(),
        };
        crate::persist::save_json(&self.file_path, &file)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    fn temp_path() -> PathBuf {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        drop(file);
        path
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").is_none());
        store.set("a", "1".to_string()).unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_file_store_persistence() {
        let path = temp_path();
        {
            let mut store = JsonFileStore::load_or_create(&path).unwrap();
            store.set("loginAttempts:10.0.0.1", "{}".to_string()).unwrap();
        }
        let store = JsonFileStore::load_or_create(&path).unwrap();
        assert_eq!(store.get("loginAttempts:10.0.0.1").as_deref(), Some("{}"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_remove() {
        let path = temp_path();
        let mut store = JsonFileStore::load_or_create(&path).unwrap();
        store.set("k", "v".to_string()).unwrap();
        store.remove("k").unwrap();
        let reloaded = JsonFileStore::load_or_create(&path).unwrap();
        assert!(reloaded.get("k").is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_truncated_file_starts_empty() {
        let path = temp_path();
        fs::write(&path, r#"{"entries":{"loginAttempts:10.0.0.1":"{\"isBlo"#).unwrap();

        let mut store = JsonFileStore::load_or_create(&path).unwrap();
        assert!(store.keys().is_empty());

        store.set("k", "v".to_string()).unwrap();
        let reloaded = JsonFileStore::load_or_create(&path).unwrap();
        assert_eq!(reloaded.get("k").as_deref(), Some("v"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guard.json");
        let mut store = JsonFileStore::load_or_create(&path).unwrap();
        store.set("a", "1".to_string()).unwrap();
        store.set("b", "2".to_string()).unwrap();

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert!(path.exists());
        assert!(!dir.path().join("guard.json.tmp").exists());
    }
}
