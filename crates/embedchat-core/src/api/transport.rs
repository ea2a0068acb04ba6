//! WidgetTransport trait definition.
//!
//! One method per public embed endpoint. Implementations map HTTP 401 on
//! token-bearing calls to [`FailureReason::Unauthorized`] and every other
//! failure to the matching `FailureReason` variant; they never retry.

use embedchat_types::error::FailureReason;
use embedchat_types::wire::{
    AskRequest, AskResponse, HandoffRequest, HandoffResponse, TokenRequest, TokenResponse,
    UpdatesRequest, UpdatesResponse,
};

/// Raw access to the public embed endpoints.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in embedchat-infra (e.g., `HttpWidgetTransport`).
pub trait WidgetTransport: Send + Sync {
    /// `POST /widget-token/by-bot/{bot_id}`.
    fn issue_token(
        &self,
        bot_id: &str,
        request: &TokenRequest,
    ) -> impl std::future::Future<Output = Result<TokenResponse, FailureReason>> + Send;

    /// `POST /ask`.
    fn ask(
        &self,
        request: &AskRequest,
    ) -> impl std::future::Future<Output = Result<AskResponse, FailureReason>> + Send;

    /// `POST /conversation/updates`.
    fn updates(
        &self,
        request: &UpdatesRequest,
    ) -> impl std::future::Future<Output = Result<UpdatesResponse, FailureReason>> + Send;

    /// `POST /handoff`.
    fn handoff(
        &self,
        request: &HandoffRequest,
    ) -> impl std::future::Future<Output = Result<HandoffResponse, FailureReason>> + Send;
}
