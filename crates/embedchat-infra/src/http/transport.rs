//! HttpWidgetTransport -- concrete [`WidgetTransport`] over the public embed
//! API.
//!
//! All calls are JSON `POST`s under `{base}/api/v1/public/embed` and carry an
//! `Origin` header equal to the session origin. Widget tokens travel in the
//! request body and are never logged.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use embedchat_core::api::transport::WidgetTransport;
use embedchat_types::error::FailureReason;
use embedchat_types::wire::{
    AskRequest, AskResponse, HandoffRequest, HandoffResponse, TokenRequest, TokenResponse,
    UpdatesRequest, UpdatesResponse,
};

const EMBED_PREFIX: &str = "/api/v1/public/embed";

/// Longest error body shown verbatim before truncation.
const MAX_DETAIL_CHARS: usize = 200;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a non-2xx status is classified for one endpoint.
#[derive(Clone, Copy)]
enum AuthMode {
    /// Token issuance: every failure is a plain status error.
    Issuance,
    /// The request presents a widget token; 401 means it was rejected.
    Bearer,
}

pub struct HttpWidgetTransport {
    client: reqwest::Client,
    base_url: String,
    origin: String,
}

impl HttpWidgetTransport {
    /// Create a transport for `api_base`, sending `origin` on every request.
    pub fn new(api_base: &str, origin: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(api_base, origin, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_base: &str,
        origin: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("embedchat/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: api_base.trim().trim_end_matches('/').to_string(),
            origin: origin.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{EMBED_PREFIX}{path}", self.base_url)
    }

    async fn post<B, R>(&self, path: &str, body: &B, mode: AuthMode) -> Result<R, FailureReason>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "embed API request");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ORIGIN, &self.origin)
            .json(body)
            .send()
            .await
            .map_err(|e| FailureReason::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%url, status = status.as_u16(), "embed API request failed");
            return Err(classify_failure(status, &body, mode));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| FailureReason::Decode(e.to_string()))
    }
}

impl WidgetTransport for HttpWidgetTransport {
    async fn issue_token(
        &self,
        bot_id: &str,
        request: &TokenRequest,
    ) -> Result<TokenResponse, FailureReason> {
        let path = format!("/widget-token/by-bot/{}", urlencoding::encode(bot_id));
        self.post(&path, request, AuthMode::Issuance).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, FailureReason> {
        self.post("/ask", request, AuthMode::Bearer).await
    }

    async fn updates(&self, request: &UpdatesRequest) -> Result<UpdatesResponse, FailureReason> {
        self.post("/conversation/updates", request, AuthMode::Bearer)
            .await
    }

    async fn handoff(&self, request: &HandoffRequest) -> Result<HandoffResponse, FailureReason> {
        self.post("/handoff", request, AuthMode::Bearer).await
    }
}

fn classify_failure(status: StatusCode, body: &str, mode: AuthMode) -> FailureReason {
    if matches!(mode, AuthMode::Bearer) && status == StatusCode::UNAUTHORIZED {
        return FailureReason::Unauthorized;
    }
    FailureReason::Status {
        status: status.as_u16(),
        detail: error_detail(status, body),
    }
}

/// Reduce an error body to something short enough to display.
///
/// `{"detail": "..."}` bodies yield the detail string. Any other non-empty
/// body is returned truncated; an empty one falls back to the status reason.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(other) if !other.is_null() => return truncate(&other.to_string()),
            _ => {}
        }
    }

    let body = body.trim();
    if body.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    truncate(body)
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DETAIL_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_DETAIL_CHARS).collect();
    cut.push('…');
    cut
}
