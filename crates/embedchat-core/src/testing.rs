//! Scripted fakes shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use embedchat_types::error::{FailureReason, StorageError};
use embedchat_types::session::Session;
use embedchat_types::wire::{
    AskRequest, AskResponse, HandoffRequest, HandoffResponse, TokenRequest, TokenResponse,
    UpdateItem, UpdatesRequest, UpdatesResponse,
};

use crate::api::transport::WidgetTransport;
use crate::storage::conversation_store::ConversationStore;

pub(crate) fn test_session() -> Session {
    Session::new("b1", "https://acme.com", Some("sess-123".to_string()))
}

pub(crate) fn ask_ok(answer: &str, conversation_id: Option<&str>) -> Result<AskResponse, FailureReason> {
    Ok(AskResponse {
        answer: answer.to_string(),
        conversation_id: conversation_id.map(str::to_string),
        citations: Vec::new(),
    })
}

pub(crate) fn agent_item(id: Option<&str>, content: &str, created_at: &str) -> UpdateItem {
    UpdateItem {
        id: id.map(str::to_string),
        role: "agent".to_string(),
        content: content.to_string(),
        created_at: Some(created_at.to_string()),
    }
}

pub(crate) fn updates_ok(items: Vec<UpdateItem>) -> Result<UpdatesResponse, FailureReason> {
    Ok(UpdatesResponse {
        conversation_id: None,
        items,
    })
}

#[derive(Default)]
struct Script {
    tokens: VecDeque<Result<TokenResponse, FailureReason>>,
    asks: VecDeque<Result<AskResponse, FailureReason>>,
    updates: VecDeque<Result<UpdatesResponse, FailureReason>>,
    handoffs: VecDeque<Result<HandoffResponse, FailureReason>>,
    token_requests: Vec<(String, TokenRequest)>,
    ask_requests: Vec<AskRequest>,
    update_requests: Vec<UpdatesRequest>,
    handoff_requests: Vec<HandoffRequest>,
}

/// Transport that replays scripted responses and records every request.
///
/// Unscripted token requests succeed with `tok-<n>`; unscripted update
/// polls return an empty batch; unscripted asks and handoffs fail.
#[derive(Clone, Default)]
pub(crate) struct FakeTransport {
    script: Arc<Mutex<Script>>,
    ask_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
    updates_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub(crate) fn push_token(&self, result: Result<TokenResponse, FailureReason>) {
        self.script().tokens.push_back(result);
    }

    pub(crate) fn push_token_value(&self, token: &str) {
        self.push_token(Ok(TokenResponse {
            token: token.to_string(),
            expires_in_seconds: Some(3600),
            bot_id: Some("b1".to_string()),
            tenant_id: Some("tenant-1".to_string()),
        }));
    }

    pub(crate) fn push_ask(&self, result: Result<AskResponse, FailureReason>) {
        self.script().asks.push_back(result);
    }

    pub(crate) fn push_updates(&self, result: Result<UpdatesResponse, FailureReason>) {
        self.script().updates.push_back(result);
    }

    pub(crate) fn push_handoff(&self, result: Result<HandoffResponse, FailureReason>) {
        self.script().handoffs.push_back(result);
    }

    /// Hold every ask until a permit is added to the returned semaphore.
    pub(crate) fn gate_asks(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.ask_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold every update poll until a permit is added.
    pub(crate) fn gate_updates(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.updates_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn token_calls(&self) -> usize {
        self.script().token_requests.len()
    }

    pub(crate) fn token_requests(&self) -> Vec<(String, TokenRequest)> {
        self.script().token_requests.clone()
    }

    pub(crate) fn ask_requests(&self) -> Vec<AskRequest> {
        self.script().ask_requests.clone()
    }

    pub(crate) fn update_requests(&self) -> Vec<UpdatesRequest> {
        self.script().update_requests.clone()
    }

    pub(crate) fn handoff_requests(&self) -> Vec<HandoffRequest> {
        self.script().handoff_requests.clone()
    }
}

impl WidgetTransport for FakeTransport {
    async fn issue_token(
        &self,
        bot_id: &str,
        request: &TokenRequest,
    ) -> Result<TokenResponse, FailureReason> {
        let mut script = self.script();
        script.token_requests.push((bot_id.to_string(), request.clone()));
        let n = script.token_requests.len();
        script.tokens.pop_front().unwrap_or_else(|| {
            Ok(TokenResponse {
                token: format!("tok-{n}"),
                expires_in_seconds: None,
                bot_id: None,
                tenant_id: None,
            })
        })
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, FailureReason> {
        self.script().ask_requests.push(request.clone());
        let gate = self.ask_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        self.script()
            .asks
            .pop_front()
            .unwrap_or_else(|| Err(FailureReason::Transport("no scripted answer".to_string())))
    }

    async fn updates(&self, request: &UpdatesRequest) -> Result<UpdatesResponse, FailureReason> {
        self.script().update_requests.push(request.clone());
        let gate = self.updates_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        self.script()
            .updates
            .pop_front()
            .unwrap_or_else(|| Ok(UpdatesResponse::default()))
    }

    async fn handoff(&self, request: &HandoffRequest) -> Result<HandoffResponse, FailureReason> {
        let mut script = self.script();
        script.handoff_requests.push(request.clone());
        script
            .handoffs
            .pop_front()
            .unwrap_or_else(|| Err(FailureReason::Transport("no scripted handoff".to_string())))
    }
}

/// In-memory store that can be switched into a failing mode.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        Ok(())
    }
}

impl ConversationStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}
