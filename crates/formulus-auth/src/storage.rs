use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// String key-value storage local to the device.
///
/// Writes to different keys are independent; there is no multi-key transaction.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key, even when an earlier removal fails. Returns the first error.
    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut first_err = None;
        for key in keys {
            if let Err(err) = self.remove_item(key).await {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        (**self).multi_remove(keys).await
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// A JSON object on disk. Every mutation rewrites the file through a temp file
/// and rename, so a crash leaves either the old or the new map.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let data = std::fs::read(&path)?;
            if data.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&data)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(entries)?)?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::Persist {
                path: self.path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.multi_remove(&[key]).await
    }

    async fn multi_remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        for key in keys {
            next.remove(*key);
        }
        if next.len() == entries.len() {
            return Ok(());
        }
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("@token").await.unwrap(), None);
        store.set_item("@token", "abc").await.unwrap();
        assert_eq!(store.get_item("@token").await.unwrap().as_deref(), Some("abc"));
        store.multi_remove(&["@token", "@absent"]).await.unwrap();
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        {
            let store = FileStore::open(&path).unwrap();
            store.set_item("@token", "abc").await.unwrap();
            store.set_item("@user", r#"{"username":"a","role":"admin"}"#).await.unwrap();
            store.remove_item("@token").await.unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("@token").await.unwrap(), None);
        assert_eq!(
            reopened.get_item("@user").await.unwrap().as_deref(),
            Some(r#"{"username":"a","role":"admin"}"#)
        );
    }

    #[tokio::test]
    async fn file_store_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Serialisation(_))
        ));
    }

    #[tokio::test]
    async fn file_store_failed_flush_keeps_previous_state() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        let path = blocked.join("session.json");
        let store = FileStore::open(&path).unwrap();
        store.set_item("@token", "abc").await.unwrap();

        // a regular file where the directory should be makes every flush fail
        std::fs::remove_dir_all(&blocked).unwrap();
        std::fs::write(&blocked, "not a directory").unwrap();

        assert!(store.set_item("@token", "def").await.is_err());
        assert!(store.set_item("@user", "u").await.is_err());
        assert!(store.remove_item("@token").await.is_err());
        assert_eq!(store.get_item("@token").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(store.get_item("@user").await.unwrap(), None);
    }

    struct FlakyStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            if key == "@refreshToken" {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "locked").into());
            }
            self.inner.remove_item(key).await
        }
    }

    #[tokio::test]
    async fn multi_remove_continues_past_failures() {
        let store = FlakyStore {
            inner: MemoryStore::new(),
        };
        for key in ["@token", "@refreshToken", "@user"] {
            store.set_item(key, "v").await.unwrap();
        }
        let res = store
            .multi_remove(&["@token", "@refreshToken", "@user"])
            .await;
        assert!(res.is_err());
        assert_eq!(store.inner.keys(), vec!["@refreshToken".to_string()]);
    }
}
