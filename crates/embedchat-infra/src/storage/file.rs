//! File-backed conversation store.
//!
//! All keys live in one JSON object file, by default
//! `{data_dir}/embedchat/conversations.json`. Writes go to a sibling temp
//! file that is then renamed over the original, and are serialized within
//! the process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use embedchat_core::storage::conversation_store::ConversationStore;
use embedchat_types::error::StorageError;

const FILE_NAME: &str = "conversations.json";

/// Resolve the default store location.
///
/// Priority:
/// 1. `EMBEDCHAT_DATA_DIR` environment variable
/// 2. Platform data directory (`dirs::data_dir()`) + `embedchat`
/// 3. `.embedchat` in the current directory
pub fn default_store_path() -> PathBuf {
    let dir = match std::env::var_os("EMBEDCHAT_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .map(|d| d.join("embedchat"))
            .unwrap_or_else(|| PathBuf::from(".embedchat")),
    };
    dir.join(FILE_NAME)
}

#[derive(Debug, Clone)]
pub struct FileConversationStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileConversationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store at [`default_store_path`].
    pub fn at_default_location() -> Self {
        Self::new(default_store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(StorageError::Io(format!("{}: {err}", self.path.display()))),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), entries = entries.len(), "conversation store written");
        Ok(())
    }
}

impl ConversationStore for FileConversationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileConversationStore::new(tmp.path().join(FILE_NAME));
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(FILE_NAME);

        let store = FileConversationStore::new(&path);
        store.set("a", "c1").await.unwrap();
        store.set("b", "c2").await.unwrap();

        let reopened = FileConversationStore::new(&path);
        assert_eq!(reopened.get("a").await.unwrap().as_deref(), Some("c1"));
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn remove_only_touches_its_key() {
        let tmp = TempDir::new().unwrap();
        let store = FileConversationStore::new(tmp.path().join(FILE_NAME));
        store.set("a", "c1").await.unwrap();
        store.set("b", "c2").await.unwrap();

        store.remove("a").await.unwrap();
        store.remove("missing").await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(FILE_NAME);
        tokio::fs::write(&path, "not { json").await.unwrap();

        let err = FileConversationStore::new(&path).get("k").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FileConversationStore::new(tmp.path().join(FILE_NAME));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.set(&format!("k{i}"), &format!("c{i}")).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for i in 0..8 {
            assert_eq!(
                store.get(&format!("k{i}")).await.unwrap(),
                Some(format!("c{i}"))
            );
        }
    }
}
