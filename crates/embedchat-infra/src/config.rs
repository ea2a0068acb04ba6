//! Widget configuration loader.
//!
//! Reads a TOML file into [`WidgetConfig`]. Unlike optional settings files,
//! a widget config names the bot and the API base, so a missing or
//! malformed file is an error rather than a reason to fall back to defaults.

use std::path::Path;

use embedchat_types::config::WidgetConfig;
use embedchat_types::error::ConfigError;

/// Load and validate a widget config from `path`.
pub async fn load_widget_config(path: &Path) -> Result<WidgetConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;

    let config = parse_widget_config(&content)
        .map_err(|e| match e {
            ConfigError::Parse(msg) => ConfigError::Parse(format!("{}: {msg}", path.display())),
            other => other,
        })?;
    tracing::debug!(path = %path.display(), bot_id = %config.bot_id, "loaded widget config");
    Ok(config)
}

/// Parse and validate a widget config from TOML text.
pub fn parse_widget_config(content: &str) -> Result<WidgetConfig, ConfigError> {
    let config: WidgetConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
