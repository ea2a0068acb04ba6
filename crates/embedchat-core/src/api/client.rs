//! ApiClient -- token-aware access to the public embed endpoints.
//!
//! Every token-bearing call follows the same discipline: when the server
//! rejects the token (HTTP 401) the token cache is invalidated and the
//! unauthorized error is returned without retrying. Retrying the whole
//! operation once with a fresh token is the caller's job.

use tracing::debug;

use embedchat_types::error::{FailureReason, WidgetError};
use embedchat_types::session::Session;
use embedchat_types::wire::{
    AskRequest, AskResponse, HandoffRequest, HandoffResponse, TokenRequest, UpdatesRequest,
    UpdatesResponse,
};

use super::token::{TokenCache, WidgetToken};
use super::transport::WidgetTransport;

/// Public embed API client for one widget session.
pub struct ApiClient<T> {
    transport: T,
    session: Session,
    tokens: TokenCache,
}

impl<T: WidgetTransport> ApiClient<T> {
    pub fn new(transport: T, session: Session) -> Self {
        Self {
            transport,
            session,
            tokens: TokenCache::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The cached widget token, issuing one only on a cache miss.
    pub async fn token(&self) -> Result<WidgetToken, WidgetError> {
        self.tokens.get_or_issue(|| self.issue_token()).await
    }

    /// Issue a fresh widget token for this session, bypassing the cache.
    pub async fn issue_token(&self) -> Result<WidgetToken, WidgetError> {
        let Session {
            bot_id,
            origin,
            session_id,
        } = &self.session;
        if bot_id.trim().is_empty() || origin.trim().is_empty() {
            return Err(WidgetError::InvalidInput(
                "bot id and origin are required to issue a widget token".to_string(),
            ));
        }

        let request = TokenRequest {
            origin: origin.clone(),
            session_id: session_id.clone(),
        };
        let response = self
            .transport
            .issue_token(bot_id, &request)
            .await
            .map_err(WidgetError::TokenIssuance)?;

        if response.token.is_empty() {
            return Err(WidgetError::TokenIssuance(FailureReason::Decode(
                "empty token in response".to_string(),
            )));
        }

        debug!(
            bot_id = %bot_id,
            expires_in_seconds = ?response.expires_in_seconds,
            tenant_id = ?response.tenant_id,
            "issued widget token"
        );
        Ok(WidgetToken::new(response.token))
    }

    /// Ask a question.
    ///
    /// A `conversation_id` in the response is the new authoritative value
    /// for this session.
    pub async fn ask(
        &self,
        token: &WidgetToken,
        question: &str,
        top_k: u32,
        memory_turns: u32,
        conversation_id: Option<&str>,
    ) -> Result<AskResponse, WidgetError> {
        let request = AskRequest {
            widget_token: token.expose().to_string(),
            question: question.to_string(),
            top_k,
            memory_turns,
            conversation_id: conversation_id.map(str::to_string),
        };

        match self.transport.ask(&request).await {
            Ok(response) => {
                debug!(
                    conversation_id = ?response.conversation_id,
                    citations = response.citations.len(),
                    "ask answered"
                );
                Ok(response)
            }
            Err(reason) => Err(self.reject(token, reason, WidgetError::Ask).await),
        }
    }

    /// Fetch conversation updates since `since_iso`.
    ///
    /// Without a conversation id there is nothing to poll for: an empty
    /// batch is returned and no request is made.
    pub async fn fetch_updates(
        &self,
        token: &WidgetToken,
        conversation_id: Option<&str>,
        since_iso: Option<&str>,
    ) -> Result<UpdatesResponse, WidgetError> {
        let Some(conversation_id) = conversation_id else {
            return Ok(UpdatesResponse::default());
        };

        let request = UpdatesRequest {
            widget_token: token.expose().to_string(),
            conversation_id: conversation_id.to_string(),
            since_iso: since_iso.map(str::to_string),
        };

        match self.transport.updates(&request).await {
            Ok(response) => Ok(response),
            Err(reason) => Err(self.reject(token, reason, WidgetError::Updates).await),
        }
    }

    /// Ask the server to hand the conversation over to a human operator.
    pub async fn request_handoff(
        &self,
        token: &WidgetToken,
        question: &str,
        conversation_id: Option<&str>,
        reason: Option<&str>,
        destination: Option<&str>,
    ) -> Result<HandoffResponse, WidgetError> {
        let request = HandoffRequest {
            widget_token: token.expose().to_string(),
            question: question.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            reason: reason.map(str::to_string),
            destination: destination.map(str::to_string),
        };

        match self.transport.handoff(&request).await {
            Ok(response) => {
                debug!(handoff_id = %response.handoff_id, status = %response.status, "handoff accepted");
                Ok(response)
            }
            Err(failure) => Err(self.reject(token, failure, WidgetError::Handoff).await),
        }
    }

    /// Map a failed call to its error, invalidating the token on 401.
    async fn reject(
        &self,
        token: &WidgetToken,
        reason: FailureReason,
        wrap: fn(FailureReason) -> WidgetError,
    ) -> WidgetError {
        if reason == FailureReason::Unauthorized && self.tokens.invalidate_if(token).await {
            debug!("widget token rejected; cache invalidated");
        }
        wrap(reason)
    }
}
