//! Session storage in a single JSON file.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use curator_auth::{SessionStorage, StorageError, StorageKey};
use tokio::sync::Mutex;

/// Stores the session keys as one JSON object (`{"access_token": "...", ...}`).
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// crash mid-write leaves either the old or the new file, never a torn one.
/// A file that fails to parse reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

type Entries = BTreeMap<String, String>;

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `{app_data_dir}/session.json`.
    pub fn at_default_location() -> anyhow::Result<Self> {
        let mut path = super::app_data_dir()?;
        path.push("session.json");
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self, key: StorageKey) -> Result<Entries, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => return Err(StorageError::read(key, err)),
        };

        match serde_json::from_str::<Entries>(&raw) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "session file is corrupt; treating as empty");
                Ok(Entries::new())
            }
        }
    }

    async fn save(&self, key: StorageKey, entries: &Entries) -> Result<(), StorageError> {
        if entries.is_empty() {
            return self.delete_file().await.map_err(|e| StorageError::write(key, e));
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::write(key, e))?;
        }

        let payload = serde_json::to_vec_pretty(entries).map_err(|e| StorageError::write(key, e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload)
            .await
            .map_err(|e| StorageError::write(key, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::write(key, e))
    }

    async fn delete_file(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load(key).await?;
        Ok(entries.remove(key.as_str()))
    }

    async fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load(key).await?;
        entries.insert(key.as_str().to_string(), value.to_string());
        self.save(key, &entries).await
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load(key).await?;
        if entries.remove(key.as_str()).is_none() {
            return Ok(());
        }
        self.save(key, &entries).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        self.delete_file().await.map_err(|e| {
            StorageError::Unavailable(format!("failed to delete {:?}: {e}", self.path))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use curator_auth::{SessionState, SessionStore};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));
        assert_eq!(storage.get(StorageKey::AccessToken).await.unwrap(), None);
        storage.remove(StorageKey::Role).await.unwrap();
        storage.clear().await.unwrap();
    }

    #[tokio::test]
    async fn set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("session.json"));

        storage.set(StorageKey::AccessToken, "t1").await.unwrap();
        storage.set(StorageKey::Role, r#"{"id":5}"#).await.unwrap();
        assert_eq!(storage.get(StorageKey::AccessToken).await.unwrap().as_deref(), Some("t1"));

        storage.remove(StorageKey::AccessToken).await.unwrap();
        assert_eq!(storage.get(StorageKey::AccessToken).await.unwrap(), None);
        assert_eq!(storage.get(StorageKey::Role).await.unwrap().as_deref(), Some(r#"{"id":5}"#));

        storage.remove(StorageKey::Role).await.unwrap();
        assert!(!storage.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_reads_empty_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{{{ not json").unwrap();
        let storage = FileStorage::new(&path);

        assert_eq!(storage.get(StorageKey::User).await.unwrap(), None);
        storage.set(StorageKey::User, "{}").await.unwrap();

        let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"user": "{}"}));
    }

    #[tokio::test]
    async fn session_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = SessionStore::new(Arc::new(FileStorage::new(&path)));
        store.rehydrate().await;
        store
            .login_value(json!({
                "access_token": "t1",
                "refresh_token": "r1",
                "user": {"id": 1, "username": "alice", "role_id": 5, "role_name": "Editor"},
                "permissions": {"read_image": true}
            }))
            .await
            .unwrap();

        let mut restarted = SessionStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(restarted.rehydrate().await, SessionState::Authenticated);
        assert!(restarted.has_permission("read_image"));
        assert_eq!(restarted.session(), store.session());

        assert!(restarted.logout().await);
        assert!(!path.exists());
    }
}
