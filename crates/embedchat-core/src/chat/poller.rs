//! Recurring agent-message poll.
//!
//! One background task per widget instance calls
//! [`ConversationController::poll_updates`] every period. The first poll
//! happens one full period after start. Failures are logged and the loop
//! keeps going. Stopping takes effect between ticks: a poll already in
//! flight runs to completion, and after teardown the controller discards
//! its result.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::controller::ConversationController;
use crate::api::transport::WidgetTransport;
use crate::storage::conversation_store::ConversationStore;

/// Handle to a running poll task.
///
/// Dropping the handle cancels the task.
pub struct UpdatePoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl UpdatePoller {
    /// Start polling `controller` every `period`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T, S>(controller: Arc<ConversationController<T, S>>, period: Duration) -> Self
    where
        T: WidgetTransport + 'static,
        S: ConversationStore + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let first_tick = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(period_ms = period.as_millis() as u64, "update poller started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if controller.is_torn_down() {
                    break;
                }
                match controller.poll_updates().await {
                    Ok(0) => {}
                    Ok(appended) => debug!(appended, "agent messages received"),
                    Err(err) => warn!("update poll failed: {err}"),
                }
            }
            info!("update poller stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the task and wait for it to exit, including any poll still
    /// in flight.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    warn!("update poller panicked: {err}");
                }
            }
        }
    }
}

impl Drop for UpdatePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
