//! Widget config resolution and mounting for CLI commands.

use anyhow::{Context, bail};

use embedchat_core::widget::WidgetInstance;
use embedchat_infra::config::load_widget_config;
use embedchat_infra::http::HttpWidgetTransport;
use embedchat_infra::storage::FileConversationStore;
use embedchat_types::config::WidgetConfig;

use super::Cli;

pub type CliWidget = WidgetInstance<HttpWidgetTransport, FileConversationStore>;

/// Build the widget config from the config file (if any) and flags.
pub async fn resolve_config(cli: &Cli) -> anyhow::Result<WidgetConfig> {
    let base = match &cli.config {
        Some(path) => Some(
            load_widget_config(path)
                .await
                .with_context(|| format!("failed to load {}", path.display()))?,
        ),
        None => None,
    };
    let config = apply_flags(base, cli)?;
    config.validate()?;
    Ok(config)
}

/// Overlay command-line flags on an optional file config.
pub fn apply_flags(base: Option<WidgetConfig>, cli: &Cli) -> anyhow::Result<WidgetConfig> {
    let mut config = match base {
        Some(config) => config,
        None => {
            let Some(api_base) = &cli.api_base else {
                bail!("no API base given: pass --api-base or use --config");
            };
            let Some(bot_id) = &cli.bot_id else {
                bail!("no bot id given: pass --bot-id or use --config");
            };
            WidgetConfig::new(api_base.clone(), bot_id.clone())
        }
    };

    if let Some(api_base) = &cli.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(bot_id) = &cli.bot_id {
        config.bot_id = bot_id.clone();
    }
    if let Some(origin) = &cli.origin {
        config.origin = Some(origin.clone());
    }
    if let Some(session_id) = &cli.session_id {
        config.session_id = Some(session_id.clone());
    }
    if let Some(conversation_id) = &cli.conversation_id {
        config.conversation_id = Some(conversation_id.clone());
    }
    if let Some(top_k) = cli.top_k {
        config.top_k = top_k;
    }
    if let Some(memory_turns) = cli.memory_turns {
        config.memory_turns = memory_turns;
    }
    Ok(config)
}

/// Mount a widget for `config` backed by HTTP and the file store.
///
/// A terminal has no host page, so the origin must be configured.
pub async fn mount(config: &WidgetConfig, cli: &Cli) -> anyhow::Result<CliWidget> {
    let Some(origin) = config.origin.as_deref().filter(|o| !o.trim().is_empty()) else {
        bail!("no origin given: pass --origin or set `origin` in the config file");
    };

    let transport = HttpWidgetTransport::new(config.api_base(), origin)
        .context("failed to build HTTP client")?;
    let store = match &cli.store {
        Some(path) => FileConversationStore::new(path),
        None => FileConversationStore::at_default_location(),
    };
    tracing::debug!(store = %store.path().display(), "using conversation store");

    let widget = WidgetInstance::mount(config, origin, transport, store).await?;
    Ok(widget)
}
