//! A mounted widget instance.
//!
//! Wires one [`ConversationController`] to its event bus and update poller.
//! Instances share nothing: two widgets mounted on the same page have their
//! own token cache, transcript, and poll task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use embedchat_types::config::WidgetConfig;
use embedchat_types::error::ConfigError;
use embedchat_types::event::WidgetEvent;

use crate::api::client::ApiClient;
use crate::api::transport::WidgetTransport;
use crate::chat::controller::{AskSettings, ConversationController, SubmitOutcome};
use crate::chat::poller::UpdatePoller;
use crate::event::EventBus;
use crate::storage::conversation_store::ConversationStore;
use crate::storage::identity::ConversationIdentity;

pub struct WidgetInstance<T, S> {
    controller: Arc<ConversationController<T, S>>,
    poller: Mutex<Option<UpdatePoller>>,
    poll_interval: Duration,
}

impl<T, S> WidgetInstance<T, S>
where
    T: WidgetTransport + 'static,
    S: ConversationStore + 'static,
{
    /// Validate `config` and build a widget bound to `page_origin`.
    ///
    /// The configured origin, when set, takes precedence over the page's.
    /// Polling is not started; call [`start`](Self::start).
    pub async fn mount(
        config: &WidgetConfig,
        page_origin: &str,
        transport: T,
        store: S,
    ) -> Result<Self, ConfigError> {
        let session = config.resolve_session(page_origin)?;
        let identity = ConversationIdentity::new(store, &session.bot_id, &session.origin);
        info!(bot_id = %session.bot_id, origin = %session.origin, "mounting widget");

        let settings = AskSettings {
            top_k: config.top_k,
            memory_turns: config.memory_turns,
        };
        let controller = ConversationController::new(
            ApiClient::new(transport, session),
            identity,
            settings,
            config.conversation_override().map(str::to_string),
            EventBus::default(),
        )
        .await;

        Ok(Self {
            controller: Arc::new(controller),
            poller: Mutex::new(None),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        })
    }

    pub fn controller(&self) -> &Arc<ConversationController<T, S>> {
        &self.controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.controller.subscribe()
    }

    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        self.controller.submit(input).await
    }

    /// Start the update poller. Returns false if it is already running or
    /// the widget has been torn down.
    pub fn start(&self) -> bool {
        if self.controller.is_torn_down() {
            return false;
        }
        let mut poller = self.lock_poller();
        if poller.as_ref().is_some_and(UpdatePoller::is_running) {
            return false;
        }
        *poller = Some(UpdatePoller::spawn(self.controller.clone(), self.poll_interval));
        true
    }

    pub fn is_polling(&self) -> bool {
        self.lock_poller()
            .as_ref()
            .is_some_and(UpdatePoller::is_running)
    }

    /// Stop the update poller, if running.
    pub async fn stop(&self) {
        let poller = self.lock_poller().take();
        if let Some(poller) = poller {
            poller.stop().await;
        }
    }

    /// Stop polling and discard the results of anything still in flight.
    pub async fn teardown(&self) {
        self.controller.teardown();
        self.stop().await;
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<UpdatePoller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeTransport, MemoryStore, ask_ok};

    fn config() -> WidgetConfig {
        WidgetConfig::new("https://api.example.com/", "b1")
    }

    #[tokio::test]
    async fn mount_uses_page_origin_and_config_settings() {
        let mut config = config();
        config.top_k = 3;
        config.memory_turns = 2;
        let transport = FakeTransport::new();
        transport.push_ask(ask_ok("Hello!", Some("c1")));

        let widget = WidgetInstance::mount(&config, "https://acme.com/pricing", transport.clone(), MemoryStore::new())
            .await
            .unwrap();
        widget.submit("hi").await;

        let (bot_id, token_request) = &transport.token_requests()[0];
        assert_eq!(bot_id, "b1");
        assert_eq!(token_request.origin, "https://acme.com");
        let ask = &transport.ask_requests()[0];
        assert_eq!((ask.top_k, ask.memory_turns), (3, 2));
    }

    #[tokio::test]
    async fn mount_rejects_invalid_config() {
        let mut config = config();
        config.top_k = 0;
        let result =
            WidgetInstance::mount(&config, "https://acme.com", FakeTransport::new(), MemoryStore::new()).await;
        assert!(matches!(result, Err(ConfigError::OutOfRange { field: "top_k", .. })));
    }

    #[tokio::test]
    async fn widgets_do_not_share_state() {
        let store = MemoryStore::new();
        let first_transport = FakeTransport::new();
        first_transport.push_ask(ask_ok("from b1", Some("c1")));
        let second_transport = FakeTransport::new();

        let first = WidgetInstance::mount(&config(), "https://acme.com", first_transport, store.clone())
            .await
            .unwrap();
        let second = WidgetInstance::mount(
            &WidgetConfig::new("https://api.example.com", "b2"),
            "https://acme.com",
            second_transport.clone(),
            store.clone(),
        )
        .await
        .unwrap();

        first.submit("hi").await;

        assert_eq!(first.controller().conversation_id().as_deref(), Some("c1"));
        assert_eq!(second.controller().conversation_id(), None);
        assert!(second.controller().transcript().is_empty());
        assert_eq!(second_transport.token_calls(), 0);
    }

    #[tokio::test]
    async fn start_is_idempotent_and_teardown_stops_polling() {
        let widget = WidgetInstance::mount(&config(), "https://acme.com", FakeTransport::new(), MemoryStore::new())
            .await
            .unwrap();

        assert!(widget.start());
        assert!(!widget.start());
        assert!(widget.is_polling());

        widget.teardown().await;
        assert!(!widget.is_polling());
        assert!(!widget.start());
        assert!(widget.controller().is_torn_down());
    }
}
