//! Conversation controller.
//!
//! Owns one widget's conversation: the transcript, the conversation id,
//! the update cursor and the seen agent ids. Submissions go through a small
//! state machine:
//!
//! - `idle -> sending` when a non-empty question is submitted,
//! - `sending -> idle` when that submission completes, whatever the result.
//!
//! While `sending`, further submissions are rejected rather than queued.
//! After teardown, operations still in flight discard their results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use embedchat_types::error::WidgetError;
use embedchat_types::event::{ControllerState, WidgetEvent};
use embedchat_types::session::Session;
use embedchat_types::transcript::{Role, TranscriptEntry};
use embedchat_types::wire::{AskResponse, HandoffResponse};

use super::display::strip_annotations;
use super::state::ConversationState;
use crate::api::client::ApiClient;
use crate::api::transport::WidgetTransport;
use crate::event::EventBus;
use crate::storage::conversation_store::ConversationStore;
use crate::storage::identity::ConversationIdentity;

/// Per-question settings forwarded to the ask endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskSettings {
    pub top_k: u32,
    pub memory_turns: u32,
}

impl Default for AskSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            memory_turns: 8,
        }
    }
}

/// Why a submission was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Input was empty after trimming.
    Empty,
    /// Another submission is in flight.
    Busy,
    /// The widget has been torn down.
    TornDown,
}

/// Result of a submission or handoff request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The bot answered; `text` is what was appended to the transcript.
    Answered { text: String },
    /// The server accepted a handoff to a human operator.
    HandedOff { handoff_id: String, status: String },
    /// The request failed; an `Error: ...` entry was appended.
    Failed(WidgetError),
    /// Nothing was sent.
    Rejected(Rejection),
    /// The widget was torn down while the request was in flight.
    Discarded,
}

/// Orchestrates token handling, persistence and the transcript for one
/// widget instance.
pub struct ConversationController<T, S> {
    api: ApiClient<T>,
    identity: ConversationIdentity<S>,
    settings: AskSettings,
    state: Mutex<ConversationState>,
    sending: AtomicBool,
    torn_down: AtomicBool,
    events: EventBus,
}

impl<T: WidgetTransport, S: ConversationStore> ConversationController<T, S> {
    /// Create a controller, restoring the persisted conversation id.
    ///
    /// An explicit `conversation_override` wins over the persisted value.
    pub async fn new(
        api: ApiClient<T>,
        identity: ConversationIdentity<S>,
        settings: AskSettings,
        conversation_override: Option<String>,
        events: EventBus,
    ) -> Self {
        let conversation_id = match conversation_override {
            Some(id) => Some(id),
            None => identity.load().await,
        };
        debug!(conversation_id = ?conversation_id, "conversation controller ready");

        Self {
            api,
            identity,
            settings,
            state: Mutex::new(ConversationState::new(conversation_id)),
            sending: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            events,
        }
    }

    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn identity(&self) -> &ConversationIdentity<S> {
        &self.identity
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn state(&self) -> ControllerState {
        if self.sending.load(Ordering::SeqCst) {
            ControllerState::Sending
        } else {
            ControllerState::Idle
        }
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock_state().transcript.entries().to_vec()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.lock_state().conversation_id.clone()
    }

    /// Current update cursor (`since_iso`).
    pub fn cursor(&self) -> Option<String> {
        self.lock_state().cursor.since_iso().map(str::to_string)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Mark the widget as torn down. In-flight operations discard their
    /// results when they complete; new ones are rejected.
    pub fn teardown(&self) {
        if !self.torn_down.swap(true, Ordering::SeqCst) {
            info!(bot_id = %self.session().bot_id, "conversation controller torn down");
        }
    }

    /// Submit a visitor question.
    pub async fn submit(&self, input: &str) -> SubmitOutcome {
        let question = input.trim();
        if question.is_empty() {
            return SubmitOutcome::Rejected(Rejection::Empty);
        }
        if self.is_torn_down() {
            return SubmitOutcome::Rejected(Rejection::TornDown);
        }
        let Some(_sending) = SendingGuard::acquire(&self.sending, &self.torn_down, &self.events) else {
            debug!("submission rejected: a question is already in flight");
            return SubmitOutcome::Rejected(Rejection::Busy);
        };

        self.append(TranscriptEntry::visitor(question));

        let result = self.ask_with_retry(question).await;
        if self.is_torn_down() {
            debug!("discarding answer received after teardown");
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(response) => {
                if let Some(conversation_id) = response.conversation_id.as_deref() {
                    self.adopt_conversation(conversation_id).await;
                }
                let text = strip_annotations(&response.answer);
                self.append(TranscriptEntry::bot(text.clone()));
                SubmitOutcome::Answered { text }
            }
            Err(err) => {
                warn!("question failed: {err}");
                self.append_error(&err);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Ask the server to hand the conversation to a human operator.
    ///
    /// Sends `question`, or the most recent visitor question when `None`.
    /// Shares the `sending` guard with `submit`.
    pub async fn request_handoff(
        &self,
        question: Option<&str>,
        reason: Option<&str>,
        destination: Option<&str>,
    ) -> SubmitOutcome {
        let question = match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q.to_string(),
            None => match self.last_visitor_question() {
                Some(q) => q,
                None => return SubmitOutcome::Rejected(Rejection::Empty),
            },
        };
        if self.is_torn_down() {
            return SubmitOutcome::Rejected(Rejection::TornDown);
        }
        let Some(_sending) = SendingGuard::acquire(&self.sending, &self.torn_down, &self.events) else {
            return SubmitOutcome::Rejected(Rejection::Busy);
        };

        let result = match self.handoff_once(&question, reason, destination).await {
            Err(err) if err.is_unauthorized() => {
                info!("widget token rejected during handoff; retrying once with a new token");
                self.handoff_once(&question, reason, destination).await
            }
            other => other,
        };
        if self.is_torn_down() {
            return SubmitOutcome::Discarded;
        }

        match result {
            Ok(response) => {
                if let Some(conversation_id) = response.conversation_id.as_deref() {
                    self.adopt_conversation(conversation_id).await;
                }
                info!(handoff_id = %response.handoff_id, status = %response.status, "handoff requested");
                self.events.publish(WidgetEvent::HandoffRequested {
                    handoff_id: response.handoff_id.clone(),
                    status: response.status.clone(),
                });
                SubmitOutcome::HandedOff {
                    handoff_id: response.handoff_id,
                    status: response.status,
                }
            }
            Err(err) => {
                warn!("handoff failed: {err}");
                self.append_error(&err);
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Fetch and merge one batch of agent messages.
    ///
    /// Returns how many entries were appended. Does nothing before the
    /// first conversation id is known.
    pub async fn poll_updates(&self) -> Result<usize, WidgetError> {
        if self.is_torn_down() {
            return Ok(0);
        }
        let (conversation_id, since_iso) = {
            let state = self.lock_state();
            (
                state.conversation_id.clone(),
                state.cursor.since_iso().map(str::to_string),
            )
        };
        let Some(conversation_id) = conversation_id else {
            return Ok(0);
        };

        let token = self.api.token().await?;
        let batch = self
            .api
            .fetch_updates(&token, Some(&conversation_id), since_iso.as_deref())
            .await?;
        if self.is_torn_down() {
            return Ok(0);
        }

        let mut state = self.lock_state();
        if state.conversation_id.as_deref() != Some(conversation_id.as_str()) {
            debug!("conversation changed during poll; dropping batch");
            return Ok(0);
        }
        let appended = state.merge_updates(batch.items);
        for entry in &appended {
            self.events.publish(WidgetEvent::AgentMessage {
                entry: entry.clone(),
            });
        }
        Ok(appended.len())
    }

    /// Drop the current conversation so the next question starts a new one.
    ///
    /// The transcript is left untouched.
    pub async fn forget_conversation(&self) {
        {
            let mut state = self.lock_state();
            state.conversation_id = None;
            state.cursor.reset();
        }
        self.identity.forget().await;
        info!("conversation forgotten");
    }

    async fn ask_with_retry(&self, question: &str) -> Result<AskResponse, WidgetError> {
        match self.ask_once(question).await {
            Err(err) if err.is_unauthorized() => {
                info!("widget token rejected; retrying once with a new token");
                self.ask_once(question).await
            }
            other => other,
        }
    }

    async fn ask_once(&self, question: &str) -> Result<AskResponse, WidgetError> {
        let token = self.api.token().await?;
        let conversation_id = self.conversation_id();
        self.api
            .ask(
                &token,
                question,
                self.settings.top_k,
                self.settings.memory_turns,
                conversation_id.as_deref(),
            )
            .await
    }

    async fn handoff_once(
        &self,
        question: &str,
        reason: Option<&str>,
        destination: Option<&str>,
    ) -> Result<HandoffResponse, WidgetError> {
        let token = self.api.token().await?;
        let conversation_id = self.conversation_id();
        self.api
            .request_handoff(
                &token,
                question,
                conversation_id.as_deref(),
                reason,
                destination,
            )
            .await
    }

    /// Make `conversation_id` the current conversation and persist it.
    async fn adopt_conversation(&self, conversation_id: &str) {
        if conversation_id.trim().is_empty() {
            return;
        }
        let changed = {
            let mut state = self.lock_state();
            let changed = state.conversation_id.as_deref() != Some(conversation_id);
            state.conversation_id = Some(conversation_id.to_string());
            changed
        };
        if changed {
            debug!(conversation_id, "conversation id updated");
        }
        self.identity.save(conversation_id).await;
    }

    fn last_visitor_question(&self) -> Option<String> {
        self.lock_state()
            .transcript
            .entries()
            .iter()
            .rev()
            .find(|e| e.role == Role::Visitor)
            .map(|e| e.text.clone())
    }

    /// Append an entry and publish its event while holding the state lock,
    /// so event order always matches transcript order.
    fn append(&self, entry: TranscriptEntry) {
        let mut state = self.lock_state();
        state.transcript.push(entry.clone());
        let event = match entry.role {
            Role::Visitor => WidgetEvent::VisitorMessage { entry },
            Role::Bot => WidgetEvent::BotMessage { entry },
            Role::Agent => WidgetEvent::AgentMessage { entry },
        };
        self.events.publish(event);
    }

    fn append_error(&self, err: &WidgetError) {
        let reason = err.to_string();
        let entry = TranscriptEntry::bot(format!("Error: {reason}"));
        let mut state = self.lock_state();
        state.transcript.push(entry.clone());
        self.events.publish(WidgetEvent::Error { entry, reason });
    }

    fn lock_state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the `sending` flag for the duration of one submission.
///
/// Dropping the guard always clears the flag. The `idle` transition is only
/// published while the controller is still mounted.
struct SendingGuard<'a> {
    flag: &'a AtomicBool,
    torn_down: &'a AtomicBool,
    events: &'a EventBus,
}

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool, torn_down: &'a AtomicBool, events: &'a EventBus) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        events.publish(WidgetEvent::StateChanged {
            state: ControllerState::Sending,
        });
        Some(Self {
            flag,
            torn_down,
            events,
        })
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        if self.torn_down.load(Ordering::SeqCst) {
            return;
        }
        self.events.publish(WidgetEvent::StateChanged {
            state: ControllerState::Idle,
        });
    }
}
