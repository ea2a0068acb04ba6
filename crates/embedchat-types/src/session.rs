//! Widget session identity.
//!
//! A `Session` identifies one widget mount: the tenant bot, the page origin
//! the widget runs on, and a random session id that scopes widget tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a single widget mount.
///
/// `bot_id` and `origin` are immutable for the lifetime of the instance.
/// `origin` is always stored normalized (see [`normalize_origin`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub bot_id: String,
    pub origin: String,
    pub session_id: String,
}

impl Session {
    /// Minimum accepted session id length (server-side constraint).
    pub const MIN_SESSION_ID_LEN: usize = 3;
    /// Maximum accepted session id length (server-side constraint).
    pub const MAX_SESSION_ID_LEN: usize = 64;

    /// Create a session, normalizing the origin.
    ///
    /// When `session_id` is `None` a fresh random id is generated.
    pub fn new(bot_id: impl Into<String>, origin: &str, session_id: Option<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            origin: normalize_origin(origin),
            session_id: session_id.unwrap_or_else(generate_session_id),
        }
    }
}

/// Generate an opaque random session id.
///
/// 32 lowercase hex characters, within the server's 3..=64 bound.
pub fn generate_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalize a page origin to `scheme://host[:port]`, lowercase, with no
/// path and no trailing slash.
///
/// Input without a scheme is treated as a bare host. Surrounding whitespace
/// is ignored.
pub fn normalize_origin(raw: &str) -> String {
    let trimmed = raw.trim();
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, trimmed),
    };
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    let origin = match scheme {
        Some(scheme) => format!("{scheme}://{authority}"),
        None => authority.to_string(),
    };
    origin.trim_end_matches('/').to_lowercase()
}
