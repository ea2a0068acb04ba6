//! In-process conversation store.
//!
//! Values live only as long as the store (and its clones). Useful for
//! embedding hosts without durable storage and for tests.

use std::sync::Arc;

use dashmap::DashMap;

use embedchat_core::storage::conversation_store::ConversationStore;
use embedchat_types::error::StorageError;

/// `DashMap`-backed [`ConversationStore`]. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryConversationStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConversationStore for MemoryConversationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryConversationStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "c1").await.unwrap();
        store.set("k", "c2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("c2"));
        assert_eq!(store.len(), 1);

        store.remove("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let store = MemoryConversationStore::new();
        let other = store.clone();
        store.set("k", "c1").await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("c1"));
    }
}
