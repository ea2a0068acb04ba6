//! Per-widget event fan-out.
//!
//! Renderers subscribe to receive transcript appends, state transitions and
//! errors. Events published while nobody listens are dropped.

use embedchat_types::event::WidgetEvent;
use tokio::sync::broadcast;

/// Channel capacity used by [`EventBus::default`].
pub const DEFAULT_CAPACITY: usize = 256;

pub struct EventBus {
    sender: broadcast::Sender<WidgetEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: WidgetEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
