//! Persistent key-value storage for string blobs.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::sync::Mutex;

use crate::error::StorageError;

/// Key under which the search history is stored.
pub const HISTORY_KEY: &str = "history";

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Returns `None` when nothing has been written under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the whole value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write-then-rename so readers never observe a partial blob.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(path = %path.display(), bytes = value.len(), "wrote store entry");
        Ok(())
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert_eq!(store.get(HISTORY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_survives_new_instance() {
        let dir = tempfile::tempdir().expect("tempdir");

        FileStore::new(dir.path()).set(HISTORY_KEY, "[1,2]").await.unwrap();
        let reopened = FileStore::new(dir.path());

        assert_eq!(reopened.get(HISTORY_KEY).await.unwrap().as_deref(), Some("[1,2]"));
        assert!(dir.path().join("history.json").exists());
        assert!(!dir.path().join("history.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let store = FileStore::new(&nested);

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        assert!(store.set("../escape", "x").await.is_err());
        assert!(store.get("").await.is_err());
    }

    #[tokio::test]
    async fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set(HISTORY_KEY, "a").await.unwrap();
        store.set(HISTORY_KEY, "b").await.unwrap();

        assert_eq!(store.get(HISTORY_KEY).await.unwrap().as_deref(), Some("b"));
    }
}
