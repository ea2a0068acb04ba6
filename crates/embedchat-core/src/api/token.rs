//! Widget token and its per-instance cache.
//!
//! The cache holds at most one token. There is no expiry timer: a token is
//! considered valid until a request presenting it is rejected, at which
//! point the cache is invalidated and the next `get_or_issue` re-issues.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use embedchat_types::error::WidgetError;

/// Opaque bearer credential scoped to (bot, origin, session).
///
/// Wrapped in [`SecretString`] so it never shows up in `Debug` output or
/// tracing logs.
pub struct WidgetToken(SecretString);

impl WidgetToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Expose the raw token for building a request body.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for WidgetToken {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl PartialEq for WidgetToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for WidgetToken {}

impl std::fmt::Debug for WidgetToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WidgetToken([REDACTED])")
    }
}

/// Single-slot token cache owned by one widget instance.
///
/// The slot lock is held while issuing, so overlapping callers that miss
/// the cache (a submission and a poll tick) share one issuance.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Option<WidgetToken>>,
    issued: AtomicU64,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token, or run `issue` and cache its result.
    ///
    /// A failed issuance leaves the cache empty.
    pub async fn get_or_issue<F, Fut>(&self, issue: F) -> Result<WidgetToken, WidgetError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WidgetToken, WidgetError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let token = issue().await?;
        self.issued.fetch_add(1, Ordering::Relaxed);
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Clear the cached token. No-op when the cache is already empty.
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }

    /// Clear the cache only if it still holds `rejected`.
    ///
    /// Returns whether a token was removed. A stale rejection observed after
    /// the token was already re-issued leaves the new token in place.
    pub async fn invalidate_if(&self, rejected: &WidgetToken) -> bool {
        let mut slot = self.slot.lock().await;
        if slot.as_ref() == Some(rejected) {
            slot.take();
            true
        } else {
            false
        }
    }

    /// The currently cached token, if any.
    pub async fn current(&self) -> Option<WidgetToken> {
        self.slot.lock().await.clone()
    }

    /// How many tokens this cache has issued over its lifetime.
    pub fn issued_count(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("issued", &self.issued_count())
            .finish()
    }
}
