//! Wire format of the public embed API.
//!
//! Request and response bodies exchanged with
//! `{base}/api/v1/public/embed/*`. Field names follow the server's
//! snake_case JSON exactly.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /widget-token/by-bot/{bot_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    pub origin: String,
    pub session_id: String,
}

/// Successful token issuance.
///
/// Only `token` is required; the metadata fields are informational and do
/// not drive client-side expiry.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default)]
    pub expires_in_seconds: Option<u64>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub widget_token: String,
    pub question: String,
    pub top_k: u32,
    pub memory_turns: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// A citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub document_id: String,
    pub chunk_id: String,
    #[serde(default)]
    pub chunk_index: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Successful answer from `POST /ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Body of `POST /conversation/updates`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatesRequest {
    pub widget_token: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_iso: Option<String>,
}

/// One message returned by the updates endpoint.
///
/// `role` is kept as the raw server string; only `"agent"` items are merged
/// into the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl UpdateItem {
    /// Whether this item was authored by a human operator.
    pub fn is_agent(&self) -> bool {
        self.role.eq_ignore_ascii_case("agent")
    }
}

/// Successful response of `POST /conversation/updates`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatesResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub items: Vec<UpdateItem>,
}

/// Body of `POST /handoff`.
#[derive(Debug, Clone, Serialize)]
pub struct HandoffRequest {
    pub widget_token: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Successful response of `POST /handoff`.
#[derive(Debug, Clone, Deserialize)]
pub struct HandoffResponse {
    pub handoff_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Accept message ids encoded either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
        Float(f64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) if !s.is_empty() => Some(s),
        Some(RawId::Unsigned(n)) => Some(n.to_string()),
        Some(RawId::Signed(n)) => Some(n.to_string()),
        Some(RawId::Float(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ask_request_omits_missing_conversation_id() {
        let req = AskRequest {
            widget_token: "t1".to_string(),
            question: "hi".to_string(),
            top_k: 5,
            memory_turns: 8,
            conversation_id: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"widget_token": "t1", "question": "hi", "top_k": 5, "memory_turns": 8})
        );
    }

    #[test]
    fn ask_response_tolerates_extra_fields() {
        let resp: AskResponse = serde_json::from_value(json!({
            "tenant_id": "t",
            "user_id": "w_b1_s",
            "question": "hi",
            "conversation_id": "c1",
            "answer": "Hello!",
            "citations": [{"document_id": "d1", "chunk_id": "c9", "chunk_index": 2}],
            "coverage": {"doc_count": 1, "chunk_count": 1}
        }))
        .unwrap();
        assert_eq!(resp.answer, "Hello!");
        assert_eq!(resp.conversation_id.as_deref(), Some("c1"));
        assert_eq!(resp.citations.len(), 1);
        assert_eq!(resp.citations[0].chunk_index, Some(2));
    }

    #[test]
    fn update_item_accepts_numeric_and_missing_ids() {
        let resp: UpdatesResponse = serde_json::from_value(json!({
            "conversation_id": "c1",
            "items": [
                {"id": 42, "role": "agent", "content": "hi", "created_at": "2024-05-01T10:00:00Z"},
                {"role": "Agent", "content": "no id"},
                {"id": "", "role": "assistant", "content": "bot"}
            ]
        }))
        .unwrap();
        assert_eq!(resp.items[0].id.as_deref(), Some("42"));
        assert!(resp.items[1].id.is_none());
        assert!(resp.items[1].is_agent());
        assert!(resp.items[2].id.is_none());
        assert!(!resp.items[2].is_agent());
    }

    #[test]
    fn update_item_accepts_any_json_number_as_id() {
        let resp: UpdatesResponse = serde_json::from_value(json!({
            "conversation_id": "c1",
            "items": [
                {"id": 18446744073709551615u64, "role": "agent", "content": "big"},
                {"id": -3, "role": "agent", "content": "negative"},
                {"id": 7.5, "role": "agent", "content": "float"}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = resp.items.iter().map(|i| i.id.as_deref()).collect();
        assert_eq!(ids, [Some("18446744073709551615"), Some("-3"), Some("7.5")]);
    }

    #[test]
    fn token_response_metadata_is_optional() {
        let resp: TokenResponse = serde_json::from_value(json!({"token": "t1"})).unwrap();
        assert_eq!(resp.token, "t1");
        assert!(resp.expires_in_seconds.is_none());
    }
}
