//! Widget configuration.
//!
//! `WidgetConfig` is supplied once when a widget is mounted and never
//! re-read afterwards. It can be built in code or deserialized from TOML.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::{Session, normalize_origin};

/// Settings for one widget mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Base URL of the embed API, e.g. `https://api.example.com`.
    pub api_base: String,
    /// Tenant bot identifier.
    pub bot_id: String,
    /// Page origin; defaults to the host page origin.
    #[serde(default)]
    pub origin: Option<String>,
    /// Session id; defaults to a freshly generated one.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Overrides the persisted conversation id.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Retrieval depth forwarded to the ask endpoint.
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Number of previous turns the server should use as memory.
    #[serde(default = "default_memory_turns")]
    pub memory_turns: u32,
    /// Period of the agent-message poll loop, in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_top_k() -> u32 {
    5
}

fn default_memory_turns() -> u32 {
    8
}

fn default_poll_interval_secs() -> u64 {
    3
}

impl WidgetConfig {
    pub const TOP_K_RANGE: (u32, u32) = (1, 20);
    pub const MEMORY_TURNS_RANGE: (u32, u32) = (0, 40);

    /// Create a config with defaults for everything but the required fields.
    pub fn new(api_base: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            bot_id: bot_id.into(),
            origin: None,
            session_id: None,
            conversation_id: None,
            top_k: default_top_k(),
            memory_turns: default_memory_turns(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }

    /// API base without surrounding whitespace or a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base.trim().trim_end_matches('/')
    }

    /// Check required fields and the server-side bounds of numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base().is_empty() {
            return Err(ConfigError::Missing("api_base"));
        }
        if self.bot_id.trim().is_empty() {
            return Err(ConfigError::Missing("bot_id"));
        }
        check_range("top_k", self.top_k, Self::TOP_K_RANGE)?;
        check_range("memory_turns", self.memory_turns, Self::MEMORY_TURNS_RANGE)?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "poll_interval_secs",
                value: 0,
                min: 1,
                max: i64::MAX,
            });
        }
        if let Some(session_id) = &self.session_id {
            let len = session_id.chars().count();
            if !(Session::MIN_SESSION_ID_LEN..=Session::MAX_SESSION_ID_LEN).contains(&len) {
                return Err(ConfigError::InvalidSessionId(format!(
                    "length {len} outside {}..={}",
                    Session::MIN_SESSION_ID_LEN,
                    Session::MAX_SESSION_ID_LEN
                )));
            }
        }
        Ok(())
    }

    /// Validate and build the session for this mount.
    ///
    /// `page_origin` is the host page's origin, used when no explicit origin
    /// is configured.
    pub fn resolve_session(&self, page_origin: &str) -> Result<Session, ConfigError> {
        self.validate()?;

        let origin = self
            .origin
            .as_deref()
            .map(normalize_origin)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| normalize_origin(page_origin));
        if origin.is_empty() {
            return Err(ConfigError::Missing("origin"));
        }

        Ok(Session::new(
            self.bot_id.trim(),
            &origin,
            self.session_id.clone(),
        ))
    }

    /// Explicit conversation id override, ignoring blank values.
    pub fn conversation_override(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

fn check_range(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: i64::from(value),
            min: i64::from(min),
            max: i64::from(max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WidgetConfig::new("https://api.example.com", "b1");
        assert_eq!(config.top_k, 5);
        assert_eq!(config.memory_turns, 8);
        assert_eq!(config.poll_interval_secs, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_defaults_fill_missing_fields() {
        let config: WidgetConfig = toml::from_str(
            r#"
api_base = "https://api.example.com/"
bot_id = "bot_123"
memory_turns = 0
"#,
        )
        .unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.memory_turns, 0);
        assert_eq!(config.api_base(), "https://api.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let config = WidgetConfig::new("  ", "b1");
        assert!(matches!(config.validate(), Err(ConfigError::Missing("api_base"))));

        let config = WidgetConfig::new("https://api.example.com", "");
        assert!(matches!(config.validate(), Err(ConfigError::Missing("bot_id"))));
    }

    #[test]
    fn test_out_of_range_settings() {
        let mut config = WidgetConfig::new("https://api.example.com", "b1");
        config.top_k = 21;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "top_k", .. })
        ));

        let mut config = WidgetConfig::new("https://api.example.com", "b1");
        config.memory_turns = 41;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "memory_turns", .. })
        ));
    }

    #[test]
    fn test_session_id_bounds() {
        let mut config = WidgetConfig::new("https://api.example.com", "b1");
        config.session_id = Some("ab".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSessionId(_))));

        config.session_id = Some("abc".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_session_prefers_configured_origin() {
        let mut config = WidgetConfig::new("https://api.example.com", "b1");
        config.origin = Some("https://Shop.Acme.com/".to_string());
        let session = config.resolve_session("https://other.example").unwrap();
        assert_eq!(session.origin, "https://shop.acme.com");
    }

    #[test]
    fn test_resolve_session_falls_back_to_page_origin() {
        let config = WidgetConfig::new("https://api.example.com", "b1");
        let session = config.resolve_session("https://acme.com/help").unwrap();
        assert_eq!(session.origin, "https://acme.com");
        assert!(!session.session_id.is_empty());

        assert!(matches!(
            config.resolve_session(""),
            Err(ConfigError::Missing("origin"))
        ));
    }

    #[test]
    fn test_conversation_override_ignores_blank() {
        let mut config = WidgetConfig::new("https://api.example.com", "b1");
        config.conversation_id = Some("  ".to_string());
        assert!(config.conversation_override().is_none());
        config.conversation_id = Some("c9".to_string());
        assert_eq!(config.conversation_override(), Some("c9"));
    }
}
