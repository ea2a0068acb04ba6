//! Conversation identity persistence.
//!
//! Correlates a browser profile with a server conversation: the
//! conversation id is stored under a key derived from the bot id and the
//! normalized origin, so a reload resumes the same conversation while other
//! bots and other origins never see it.
//!
//! Storage is best-effort. A failing store degrades to an in-memory
//! conversation that simply does not survive a reload.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::{debug, warn};

use super::conversation_store::ConversationStore;

const KEY_PREFIX: &str = "embedchat:conversation";

/// Derive the storage key for a (bot, origin) pair.
///
/// Both parts are base64url-encoded; that alphabet has no `:`, so distinct
/// pairs always produce distinct keys.
pub fn storage_key(bot_id: &str, origin: &str) -> String {
    format!(
        "{KEY_PREFIX}:{}:{}",
        URL_SAFE_NO_PAD.encode(bot_id.as_bytes()),
        URL_SAFE_NO_PAD.encode(origin.as_bytes())
    )
}

/// Persisted conversation id for one (bot, origin) pair.
pub struct ConversationIdentity<S> {
    store: S,
    key: String,
}

impl<S: ConversationStore> ConversationIdentity<S> {
    /// `origin` must already be normalized.
    pub fn new(store: S, bot_id: &str, origin: &str) -> Self {
        Self {
            store,
            key: storage_key(bot_id, origin),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the stored conversation id.
    ///
    /// Absence is a normal initial condition. Storage failures and blank
    /// values are treated as absence.
    pub async fn load(&self) -> Option<String> {
        match self.store.get(&self.key).await {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(err) => {
                warn!(key = %self.key, "conversation id unavailable, starting fresh: {err}");
                None
            }
        }
    }

    /// Store a conversation id, replacing any previous one. Best-effort.
    pub async fn save(&self, conversation_id: &str) {
        match self.store.set(&self.key, conversation_id).await {
            Ok(()) => debug!(key = %self.key, "conversation id persisted"),
            Err(err) => warn!(key = %self.key, "failed to persist conversation id: {err}"),
        }
    }

    /// Remove the stored conversation id. Best-effort.
    pub async fn forget(&self) {
        if let Err(err) = self.store.remove(&self.key).await {
            warn!(key = %self.key, "failed to clear conversation id: {err}");
        }
    }
}
