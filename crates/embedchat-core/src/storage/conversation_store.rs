//! Conversation store trait.
//!
//! A flat string-to-string store standing in for the browser's per-origin
//! durable storage. Every method can fail (storage disabled, quota, IO);
//! callers decide whether a failure matters.

use embedchat_types::error::StorageError;

/// Trait for durable key-value storage of conversation ids.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in embedchat-infra.
pub trait ConversationStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Set a value for a key (upsert).
    fn set(
        &self,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Delete a key. No-op if the key does not exist.
    fn remove(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
